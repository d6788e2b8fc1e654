//! Downloads tray actions
//!
//! Each (download, action) pair is guarded while its command is in flight,
//! so a double click issues one command. Failures leave the view untouched
//! and can simply be retried.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use harbor_ipc::{Command, DownloadTarget, DownloadsClear, UiClient};

use crate::error::UiError;
use crate::store::UiStore;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadAction {
    Pause,
    Resume,
    Cancel,
    Clear,
    ShowInFolder,
}

impl DownloadAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadAction::Pause => "pause",
            DownloadAction::Resume => "resume",
            DownloadAction::Cancel => "cancel",
            DownloadAction::Clear => "clear",
            DownloadAction::ShowInFolder => "show-in-folder",
        }
    }

    fn command(&self, id: &str) -> Command {
        let target = DownloadTarget {
            download_id: id.to_string(),
        };
        match self {
            DownloadAction::Pause => Command::PauseDownload(target),
            DownloadAction::Resume => Command::ResumeDownload(target),
            DownloadAction::Cancel => Command::CancelDownload(target),
            DownloadAction::Clear => Command::ClearDownloads(DownloadsClear {
                download_id: Some(target.download_id),
            }),
            DownloadAction::ShowInFolder => Command::ShowDownloadInFolder(target),
        }
    }
}

impl std::fmt::Display for DownloadAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type BusySet = Arc<Mutex<HashSet<(String, DownloadAction)>>>;

/// Releases the busy flag even if the caller's future is dropped
struct BusyGuard {
    busy: BusySet,
    key: (String, DownloadAction),
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.lock().remove(&self.key);
    }
}

pub struct DownloadActions {
    client: UiClient,
    store: UiStore,
    busy: BusySet,
}

impl DownloadActions {
    pub fn new(client: UiClient, store: UiStore) -> Self {
        Self {
            client,
            store,
            busy: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn pause(&self, id: &str) -> Result<()> {
        self.run(id, DownloadAction::Pause).await
    }

    pub async fn resume(&self, id: &str) -> Result<()> {
        self.run(id, DownloadAction::Resume).await
    }

    pub async fn cancel(&self, id: &str) -> Result<()> {
        self.run(id, DownloadAction::Cancel).await
    }

    /// On success the row disappears from the store immediately.
    pub async fn clear(&self, id: &str) -> Result<()> {
        self.run(id, DownloadAction::Clear).await
    }

    pub async fn show_in_folder(&self, id: &str) -> Result<()> {
        self.run(id, DownloadAction::ShowInFolder).await
    }

    pub fn is_busy(&self, id: &str, action: DownloadAction) -> bool {
        self.busy.lock().contains(&(id.to_string(), action))
    }

    async fn run(&self, id: &str, action: DownloadAction) -> Result<()> {
        let key = (id.to_string(), action);
        if !self.busy.lock().insert(key.clone()) {
            tracing::debug!(download_id = %id, action = %action, "Ignoring duplicate action");
            return Err(UiError::Busy {
                download_id: id.to_string(),
                action,
            });
        }
        let _guard = BusyGuard {
            busy: self.busy.clone(),
            key,
        };

        match self.client.invoke(action.command(id)).await {
            Ok(_) => {
                if action == DownloadAction::Clear {
                    self.store.update(|state| state.remove_download(id));
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(download_id = %id, action = %action, error = %e, "Download action failed");
                Err(e.into())
            }
        }
    }
}

impl Clone for DownloadActions {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            store: self.store.clone(),
            busy: self.busy.clone(),
        }
    }
}
