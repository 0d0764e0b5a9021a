//! igswap Tab Registry
//!
//! Cookie changes do not reach a page that is already loaded, so after a
//! session swap every open tab on the target site has to be reloaded.
//! The extension reports its tabs here; `TabReloader::reload_site` picks the
//! ones to reload.

mod error;
mod manager;
mod tab;

pub use error::TabError;
pub use manager::{TabManager, TabReloader};
pub use tab::{Tab, TabId, TabStatus};

pub type Result<T> = std::result::Result<T, TabError>;
