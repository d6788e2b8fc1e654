//! Privacy error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrivacyError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("No pending permission request {0}")]
    UnknownRequest(u64),

    #[error("Storage error: {0}")]
    Storage(#[from] harbor_storage::StorageError),
}
