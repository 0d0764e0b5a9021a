//! igswap Core
//!
//! Central coordination layer: the `Background` state container owns the
//! session store, the tab registry and a mirror of the browser's cookies,
//! and answers one protocol request at a time.

mod background;
mod config;
mod error;
mod protocol;
mod worker;

pub use background::Background;
pub use config::Config;
pub use error::CoreError;
pub use protocol::{LoadedSession, Request, Response, ACTIONS};
pub use worker::{spawn_worker, WorkerHandle};

// Re-export core components
pub use igswap_cookies::{
    BrowserCookieJar, Cookie, CookieError, CookieJar, CookieOp, MemoryCookieJar, SameSite,
};
pub use igswap_session::{
    AccountSession, AccountStatus, Activation, SessionError, SessionList, SessionStore,
    SiteConfig,
};
pub use igswap_storage::{Database, StorageError};
pub use igswap_tabs::{Tab, TabError, TabId, TabManager, TabReloader, TabStatus};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// Events go to stderr: stdout carries the native messaging channel.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
