//! Tab error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(i64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
