//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No session found: no cookies for {0}")]
    NoSession(String),

    #[error("Not logged in: no {0} cookie")]
    NotAuthenticated(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] igswap_storage::StorageError),

    #[error("Cookie jar error: {0}")]
    Cookie(#[from] igswap_cookies::CookieError),
}
