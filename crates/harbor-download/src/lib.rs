//! Harbor Download Manager
//!
//! The download engine itself is external. It reports lifecycle events and
//! hands over a control handle; this crate validates every state change
//! against the lifecycle graph, persists it, and derives the transfer
//! metrics the downloads tray shows.

mod control;
mod derived;
mod error;
mod manager;

pub use control::{DownloadControl, DownloadEvent, NewDownload};
pub use derived::{eta_seconds, progress_percent, throughput, DownloadMetrics};
pub use error::DownloadError;
pub use manager::DownloadManager;

pub use harbor_storage::{Download, DownloadState};

pub type Result<T> = std::result::Result<T, DownloadError>;
