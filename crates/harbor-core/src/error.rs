//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] harbor_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] harbor_tabs::TabError),

    #[error("Download error: {0}")]
    Download(#[from] harbor_download::DownloadError),

    #[error("Permission error: {0}")]
    Privacy(#[from] harbor_privacy::PrivacyError),

    #[error("Channel error: {0}")]
    Ipc(#[from] harbor_ipc::IpcError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background service stopped")]
    Stopped,
}
