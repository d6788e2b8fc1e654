//! Download error types

use harbor_storage::DownloadState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Download not found: {0}")]
    NotFound(String),

    #[error("Invalid download transition: {from} -> {to}")]
    InvalidTransition { from: DownloadState, to: DownloadState },

    #[error("Download {0} is still active and cannot be cleared")]
    NotClearable(String),

    #[error("Download {0} has no file on disk")]
    NoPath(String),

    #[error("Download engine error: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(#[from] harbor_storage::StorageError),
}
