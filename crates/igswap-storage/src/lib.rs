//! igswap Storage Layer
//!
//! SQLite-backed persistence shared by the session store and the cookie jar.
//! The `local_storage` table mirrors an extension's local key-value area:
//! every value is a JSON document addressed by a string key.

mod database;
mod error;
mod local;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use local::LocalArea;

pub type Result<T> = std::result::Result<T, StorageError>;
