//! igswap Session Store
//!
//! - A session is a labelled snapshot of one account's cookies
//! - At most one session per account key; saving again replaces it in place
//! - Activating a session swaps the live cookie jar to the snapshot and
//!   reloads the site's open tabs
//! - `activeSessionId` only points at the last activated session

mod error;
mod session;
mod site;
mod store;

pub use error::SessionError;
pub use session::{AccountSession, AccountStatus, Activation, SessionList, UNKNOWN_ACCOUNT};
pub use site::SiteConfig;
pub use store::{SessionStore, ACTIVE_SESSION_KEY, SESSIONS_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
