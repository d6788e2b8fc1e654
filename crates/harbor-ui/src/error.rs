//! UI error types

use thiserror::Error;

use crate::downloads::DownloadAction;

#[derive(Error, Debug)]
pub enum UiError {
    #[error("Channel error: {0}")]
    Ipc(#[from] harbor_ipc::IpcError),

    #[error("{action} already in progress for download {download_id}")]
    Busy {
        download_id: String,
        action: DownloadAction,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
