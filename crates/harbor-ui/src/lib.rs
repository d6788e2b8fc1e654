//! Harbor UI Reconciliation
//!
//! Client side of the channel protocol:
//! - `UiStore` merges background broadcasts into one view-model
//! - Identical snapshots are dropped before they touch derived state
//! - `UrlSync` keeps address bar and router from echoing each other
//! - `DownloadActions` guards tray buttons while their command is in flight
//! - `HistoryActions` clears or reloads the recent history list

mod downloads;
mod error;
mod history;
mod state;
mod store;
mod url_sync;

pub use downloads::{DownloadAction, DownloadActions};
pub use error::UiError;
pub use history::HistoryActions;
pub use state::{UiState, RECENT_HISTORY_LIMIT};
pub use store::UiStore;
pub use url_sync::{SyncDirection, UrlSync, DEFAULT_COOLDOWN};

pub type Result<T> = std::result::Result<T, UiError>;
