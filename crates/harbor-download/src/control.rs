//! Seam to the external download engine

use std::sync::Arc;

use harbor_storage::DownloadState;

use crate::Result;

/// Handle the engine gives us to steer one transfer.
pub trait DownloadControl: Send + Sync {
    fn pause(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;
    fn cancel(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDownload {
    /// Engine-assigned id; a UUID is generated when absent
    pub id: Option<String>,
    pub url: String,
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub bytes_total: Option<u64>,
    pub path: Option<String>,
}

impl NewDownload {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Lifecycle reports from the engine.
#[derive(Clone)]
pub enum DownloadEvent {
    Started {
        download: NewDownload,
        control: Option<Arc<dyn DownloadControl>>,
    },
    Progress {
        id: String,
        bytes_received: u64,
        bytes_total: Option<u64>,
    },
    Finished {
        id: String,
        state: DownloadState,
        path: Option<String>,
    },
}

impl DownloadEvent {
    pub fn id(&self) -> Option<&str> {
        match self {
            DownloadEvent::Started { download, .. } => download.id.as_deref(),
            DownloadEvent::Progress { id, .. } | DownloadEvent::Finished { id, .. } => Some(id),
        }
    }
}

impl std::fmt::Debug for DownloadEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadEvent::Started { download, control } => f
                .debug_struct("Started")
                .field("download", download)
                .field("has_control", &control.is_some())
                .finish(),
            DownloadEvent::Progress {
                id,
                bytes_received,
                bytes_total,
            } => f
                .debug_struct("Progress")
                .field("id", id)
                .field("bytes_received", bytes_received)
                .field("bytes_total", bytes_total)
                .finish(),
            DownloadEvent::Finished { id, state, path } => f
                .debug_struct("Finished")
                .field("id", id)
                .field("state", state)
                .field("path", path)
                .finish(),
        }
    }
}
