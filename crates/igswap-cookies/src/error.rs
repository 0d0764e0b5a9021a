//! Cookie error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Invalid cookie url: {0}")]
    InvalidUrl(String),

    #[error("Cookie {name} rejected: {reason}")]
    Rejected { name: String, reason: String },
}
