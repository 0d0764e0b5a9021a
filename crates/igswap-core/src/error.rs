//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] igswap_storage::StorageError),

    #[error(transparent)]
    Session(#[from] igswap_session::SessionError),

    #[error(transparent)]
    Tab(#[from] igswap_tabs::TabError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Background worker stopped")]
    WorkerStopped,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
