//! Harbor Storage Layer
//!
//! SQLite-based persistence for browsing history, downloads, per-origin
//! permission decisions and settings. Every logical write runs in its own
//! transaction together with the retention sweep for the table it touches.

mod database;
mod downloads;
mod error;
mod history;
mod migrations;
mod permissions;
mod retention;
mod settings;

pub use database::Database;
pub use downloads::{Download, DownloadPatch, DownloadState, DownloadWrite};
pub use error::StorageError;
pub use history::{HistoryEntry, NewNavigation, Transition, Visit};
pub use permissions::{PermissionRecord, PermissionSetting};
pub use retention::{RetentionPolicy, DOWNLOAD_MAX_ENTRIES, HISTORY_MAX_ENTRIES, RETENTION_DAYS};

pub type Result<T> = std::result::Result<T, StorageError>;
