//! Download manager
//!
//! Background-side authority over download state. Engine events and user
//! commands both funnel through here; either may arrive after the other
//! has already finished the transfer, so every change is checked against
//! the lifecycle graph first.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use harbor_storage::{Database, Download, DownloadPatch, DownloadState, DownloadWrite};

use crate::control::{DownloadControl, NewDownload};
use crate::error::DownloadError;
use crate::Result;

pub struct DownloadManager {
    /// In-memory download cache
    downloads: Arc<RwLock<HashMap<String, Download>>>,
    /// Engine handles for transfers still running
    controls: Arc<RwLock<HashMap<String, Arc<dyn DownloadControl>>>>,
    /// Rows the retention sweep removed, not yet reported
    evicted: Arc<Mutex<Vec<Download>>>,
    db: Database,
}

impl DownloadManager {
    pub fn new(db: Database) -> Self {
        Self {
            downloads: Arc::new(RwLock::new(HashMap::new())),
            controls: Arc::new(RwLock::new(HashMap::new())),
            evicted: Arc::new(Mutex::new(Vec::new())),
            db,
        }
    }

    /// Load stored downloads. Transfers that were running or paused when the
    /// previous process exited have no engine behind them any more and are
    /// marked interrupted; paused rows settle through in_progress, as a
    /// paused transfer the engine fails would.
    pub fn load(&self) -> Result<usize> {
        let mut loaded = Vec::new();
        let mut swept = HashSet::new();

        for download in self.db.list_downloads()? {
            if download.state.is_terminal() {
                loaded.push(download);
                continue;
            }

            let patch = DownloadPatch {
                state: Some(DownloadState::Interrupted),
                completed_at: Some(Utc::now()),
                ..DownloadPatch::default()
            };
            let write = self.db.update_download_with_sweep(&download.id, &patch)?;
            tracing::info!(download_id = %write.download.id, "Marked orphaned download interrupted");
            swept.extend(write.swept);
            loaded.push(write.download);
        }

        let mut cache = self.downloads.write();
        for download in loaded {
            if !swept.contains(&download.id) {
                cache.insert(download.id.clone(), download);
            }
        }

        Ok(cache.len())
    }

    /// Register a transfer the engine just started. A repeated report for a
    /// known id is ignored; a still-running transfer adopts the new handle.
    pub fn begin(
        &self,
        new: NewDownload,
        control: Option<Arc<dyn DownloadControl>>,
    ) -> Result<Option<Download>> {
        let id = new
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(current) = self.get(&id) {
            if let Some(control) = control.filter(|_| !current.state.is_terminal()) {
                self.controls.write().insert(id.clone(), control);
            }
            tracing::debug!(download_id = %id, state = %current.state, "Ignoring repeated start");
            return Ok(None);
        }

        let mut download = Download::new(id, new.url);
        download.filename = new.filename;
        download.mime = new.mime;
        download.bytes_total = new.bytes_total;
        download.path = new.path;

        let write = self.db.record_download_with_sweep(&download)?;
        let saved = self.cache(write);
        if let (Some(saved), Some(control)) = (&saved, control) {
            self.controls.write().insert(saved.id.clone(), control);
        }

        match &saved {
            Some(saved) => tracing::info!(download_id = %saved.id, url = %saved.url, "Started download"),
            None => tracing::debug!(download_id = %download.id, "Started download fell outside retention"),
        }

        Ok(saved)
    }

    /// Apply a progress tick. Ticks for finished transfers are dropped.
    pub fn progress(
        &self,
        id: &str,
        bytes_received: u64,
        bytes_total: Option<u64>,
    ) -> Result<Option<Download>> {
        let current = self.get(id)?;
        if current.state.is_terminal() {
            tracing::debug!(download_id = %id, state = %current.state, "Ignoring late progress");
            return Ok(None);
        }

        let patch = DownloadPatch {
            bytes_received: Some(bytes_received),
            bytes_total,
            ..DownloadPatch::default()
        };

        self.store(id, &patch).map(Some)
    }

    /// The engine reports the transfer ended. A no-op if it already had.
    pub fn finish(&self, id: &str, state: DownloadState, path: Option<String>) -> Result<Option<Download>> {
        let current = self.get(id)?;
        if current.state.is_terminal() {
            tracing::debug!(download_id = %id, state = %current.state, "Download already finished");
            return Ok(None);
        }
        if !state.is_terminal() {
            return Err(DownloadError::InvalidTransition {
                from: current.state,
                to: state,
            });
        }

        // A transfer the user paused can still complete or fail underneath;
        // it passes back through in_progress on the way.
        if !current.state.can_transition_to(state)
            && !(current.state.can_transition_to(DownloadState::InProgress)
                && DownloadState::InProgress.can_transition_to(state))
        {
            return Err(DownloadError::InvalidTransition {
                from: current.state,
                to: state,
            });
        }

        let patch = DownloadPatch {
            state: Some(state),
            path,
            bytes_received: (state == DownloadState::Completed)
                .then_some(current.bytes_total)
                .flatten()
                .map(|total| total.max(current.bytes_received)),
            completed_at: Some(Utc::now()),
            ..DownloadPatch::default()
        };

        let finished = self.store(id, &patch)?;
        self.controls.write().remove(id);

        tracing::info!(download_id = %id, state = %finished.state, "Download finished");
        Ok(Some(finished))
    }

    pub fn pause(&self, id: &str) -> Result<Download> {
        self.command(id, DownloadState::Paused, |control| control.pause())
    }

    pub fn resume(&self, id: &str) -> Result<Download> {
        self.command(id, DownloadState::InProgress, |control| control.resume())
    }

    pub fn cancel(&self, id: &str) -> Result<Download> {
        self.command(id, DownloadState::Cancelled, |control| control.cancel())
    }

    /// Remove a finished download from the list. Active ones must be
    /// cancelled first.
    pub fn clear(&self, id: &str) -> Result<Download> {
        let current = self.get(id)?;
        if !current.state.is_terminal() {
            return Err(DownloadError::NotClearable(id.to_string()));
        }

        self.db.delete_download(id)?;
        self.downloads.write().remove(id);

        tracing::info!(download_id = %id, "Cleared download");
        Ok(current)
    }

    /// Clear every finished download. Returns the removed rows.
    pub fn clear_finished(&self) -> Result<Vec<Download>> {
        let finished: Vec<Download> = self
            .list()
            .into_iter()
            .filter(|d| d.state.is_terminal())
            .collect();

        for download in &finished {
            self.db.delete_download(&download.id)?;
            self.downloads.write().remove(&download.id);
        }

        Ok(finished)
    }

    pub fn get(&self, id: &str) -> Result<Download> {
        self.downloads
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound(id.to_string()))
    }

    /// All known downloads, newest first
    pub fn list(&self) -> Vec<Download> {
        let mut downloads: Vec<Download> = self.downloads.read().values().cloned().collect();
        downloads.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| b.id.cmp(&a.id)));
        downloads
    }

    pub fn active(&self) -> Vec<Download> {
        self.list()
            .into_iter()
            .filter(|d| !d.state.is_terminal())
            .collect()
    }

    /// File location of a download, for revealing it in the file manager
    pub fn path_of(&self, id: &str) -> Result<PathBuf> {
        self.get(id)?
            .path
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| DownloadError::NoPath(id.to_string()))
    }

    fn command<F>(&self, id: &str, target: DownloadState, apply: F) -> Result<Download>
    where
        F: FnOnce(&dyn DownloadControl) -> Result<()>,
    {
        let current = self.get(id)?;
        if !current.state.can_transition_to(target) {
            tracing::debug!(
                download_id = %id,
                from = %current.state,
                to = %target,
                "Rejected download command"
            );
            return Err(DownloadError::InvalidTransition {
                from: current.state,
                to: target,
            });
        }

        let control = self.controls.read().get(id).cloned();
        match control {
            Some(control) => apply(control.as_ref())?,
            // Nothing left to steer; cancelling still settles the row
            None if target == DownloadState::Cancelled => {}
            None => {
                return Err(DownloadError::Engine(format!(
                    "no engine handle for download {id}"
                )))
            }
        }

        let mut patch = DownloadPatch::state(target);
        if target.is_terminal() {
            patch.completed_at = Some(Utc::now());
            self.controls.write().remove(id);
        }

        let updated = self.store(id, &patch)?;
        tracing::info!(download_id = %id, state = %updated.state, "Download state changed");
        Ok(updated)
    }

    /// Rows the retention sweep removed since the last call
    pub fn take_evicted(&self) -> Vec<Download> {
        std::mem::take(&mut *self.evicted.lock())
    }

    fn store(&self, id: &str, patch: &DownloadPatch) -> Result<Download> {
        let write = self.db.update_download_with_sweep(id, patch)?;
        let updated = write.download.clone();
        self.cache(write);
        Ok(updated)
    }

    /// Mirror a write into the cache, dropping whatever the sweep removed.
    /// Returns the written row unless it was swept itself.
    fn cache(&self, write: DownloadWrite) -> Option<Download> {
        let DownloadWrite { download, swept } = write;

        let mut cache = self.downloads.write();
        cache.insert(download.id.clone(), download.clone());

        let mut evicted = self.evicted.lock();
        for id in &swept {
            self.controls.write().remove(id);
            if let Some(removed) = cache.remove(id) {
                tracing::debug!(download_id = %id, "Evicted swept download");
                evicted.push(removed);
            }
        }

        (!swept.contains(&download.id)).then_some(download)
    }
}

impl Clone for DownloadManager {
    fn clone(&self) -> Self {
        Self {
            downloads: Arc::clone(&self.downloads),
            controls: Arc::clone(&self.controls),
            evicted: Arc::clone(&self.evicted),
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::progress_percent;
    use harbor_storage::RetentionPolicy;

    #[derive(Default)]
    struct FakeControl {
        calls: Mutex<Vec<&'static str>>,
        fail: bool,
    }

    impl DownloadControl for FakeControl {
        fn pause(&self) -> Result<()> {
            self.record("pause")
        }

        fn resume(&self) -> Result<()> {
            self.record("resume")
        }

        fn cancel(&self) -> Result<()> {
            self.record("cancel")
        }
    }

    impl FakeControl {
        fn record(&self, call: &'static str) -> Result<()> {
            if self.fail {
                return Err(DownloadError::Engine("engine gone".to_string()));
            }
            self.calls.lock().push(call);
            Ok(())
        }
    }

    fn started(manager: &DownloadManager) -> (Download, Arc<FakeControl>) {
        let control = Arc::new(FakeControl::default());
        let new = NewDownload {
            filename: Some("file.bin".to_string()),
            path: Some("/downloads/file.bin".to_string()),
            bytes_total: Some(100),
            ..NewDownload::new("https://example.com/file.bin")
        };
        let download = manager
            .begin(new, Some(control.clone() as Arc<dyn DownloadControl>))
            .unwrap()
            .unwrap();
        (download, control)
    }

    #[test]
    fn test_download_lifecycle() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let (download, _control) = started(&manager);

        assert_eq!(download.state, DownloadState::InProgress);
        assert_eq!(progress_percent(&download), 0.0);

        let half = manager.progress(&download.id, 50, None).unwrap().unwrap();
        assert_eq!(progress_percent(&half), 50.0);

        let full = manager.progress(&download.id, 100, None).unwrap().unwrap();
        assert_eq!(progress_percent(&full), 100.0);

        let done = manager
            .finish(&download.id, DownloadState::Completed, None)
            .unwrap()
            .unwrap();
        assert_eq!(done.state, DownloadState::Completed);
        assert!(done.completed_at.is_some());
        assert_eq!(done.path.as_deref(), Some("/downloads/file.bin"));

        // Pausing a finished download changes nothing
        let err = manager.pause(&download.id).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidTransition { .. }));
        assert_eq!(manager.get(&download.id).unwrap().state, DownloadState::Completed);
    }

    #[test]
    fn test_pause_resume_cancel_reach_engine() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let (download, control) = started(&manager);

        assert_eq!(manager.pause(&download.id).unwrap().state, DownloadState::Paused);
        assert!(manager.pause(&download.id).is_err());
        assert_eq!(manager.resume(&download.id).unwrap().state, DownloadState::InProgress);
        assert_eq!(manager.cancel(&download.id).unwrap().state, DownloadState::Cancelled);

        assert_eq!(*control.calls.lock(), vec!["pause", "resume", "cancel"]);
        assert!(manager.resume(&download.id).is_err());
    }

    #[test]
    fn test_engine_failure_leaves_state_unchanged() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let control = Arc::new(FakeControl {
            fail: true,
            ..FakeControl::default()
        });
        let download = manager
            .begin(NewDownload::new("https://example.com/a"), Some(control as Arc<dyn DownloadControl>))
            .unwrap()
            .unwrap();

        assert!(matches!(manager.pause(&download.id), Err(DownloadError::Engine(_))));
        assert_eq!(manager.get(&download.id).unwrap().state, DownloadState::InProgress);
    }

    #[test]
    fn test_late_events_after_cancel_are_ignored() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let (download, _control) = started(&manager);

        manager.cancel(&download.id).unwrap();
        assert!(manager.progress(&download.id, 80, None).unwrap().is_none());
        assert!(manager
            .finish(&download.id, DownloadState::Completed, None)
            .unwrap()
            .is_none());
        assert_eq!(manager.get(&download.id).unwrap().state, DownloadState::Cancelled);
    }

    #[test]
    fn test_paused_download_can_still_complete() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let (download, _control) = started(&manager);

        manager.pause(&download.id).unwrap();
        let done = manager
            .finish(&download.id, DownloadState::Completed, None)
            .unwrap()
            .unwrap();
        assert_eq!(done.state, DownloadState::Completed);
        assert_eq!(done.bytes_received, 100);
    }

    #[test]
    fn test_clear_requires_terminal() {
        let db = Database::open_in_memory().unwrap();
        let manager = DownloadManager::new(db.clone());
        let (download, _control) = started(&manager);

        assert!(matches!(
            manager.clear(&download.id),
            Err(DownloadError::NotClearable(_))
        ));

        manager.cancel(&download.id).unwrap();
        manager.clear(&download.id).unwrap();
        assert!(manager.list().is_empty());
        assert!(db.get_download(&download.id).unwrap().is_none());
    }

    #[test]
    fn test_load_interrupts_orphans() {
        let db = Database::open_in_memory().unwrap();
        {
            let manager = DownloadManager::new(db.clone());
            started(&manager);
        }

        let manager = DownloadManager::new(db);
        assert_eq!(manager.load().unwrap(), 1);
        let downloads = manager.list();
        assert_eq!(downloads[0].state, DownloadState::Interrupted);
        assert!(manager.active().is_empty());
    }

    #[test]
    fn test_repeated_start_keeps_terminal_state() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let new = NewDownload {
            id: Some("d1".to_string()),
            ..NewDownload::new("https://example.com/file.bin")
        };

        manager.begin(new.clone(), None).unwrap().unwrap();
        manager.finish("d1", DownloadState::Completed, None).unwrap();

        assert!(manager.begin(new, None).unwrap().is_none());
        assert_eq!(manager.get("d1").unwrap().state, DownloadState::Completed);
    }

    #[test]
    fn test_swept_downloads_leave_the_cache() {
        let policy = RetentionPolicy {
            download_max_entries: 2,
            ..RetentionPolicy::default()
        };
        let db = Database::open_in_memory_with(policy).unwrap();
        let manager = DownloadManager::new(db.clone());

        for i in 0..4 {
            let new = NewDownload {
                id: Some(format!("d{i}")),
                ..NewDownload::new(format!("https://example.com/{i}.bin"))
            };
            manager.begin(new, None).unwrap();
        }

        assert_eq!(db.download_count().unwrap(), 2);
        let ids: Vec<String> = manager.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["d3".to_string(), "d2".to_string()]);

        let mut evicted: Vec<String> = manager.take_evicted().into_iter().map(|d| d.id).collect();
        evicted.sort();
        assert_eq!(evicted, vec!["d0".to_string(), "d1".to_string()]);
        assert!(manager.take_evicted().is_empty());

        assert!(matches!(manager.cancel("d0"), Err(DownloadError::NotFound(_))));
    }

    #[test]
    fn test_load_interrupts_paused_rows() {
        let db = Database::open_in_memory().unwrap();
        {
            let manager = DownloadManager::new(db.clone());
            let (download, _control) = started(&manager);
            manager.pause(&download.id).unwrap();
        }

        let manager = DownloadManager::new(db);
        assert_eq!(manager.load().unwrap(), 1);
        assert_eq!(manager.list()[0].state, DownloadState::Interrupted);
    }

    #[test]
    fn test_path_of() {
        let manager = DownloadManager::new(Database::open_in_memory().unwrap());
        let (download, _control) = started(&manager);
        assert_eq!(
            manager.path_of(&download.id).unwrap(),
            PathBuf::from("/downloads/file.bin")
        );

        let bare = manager
            .begin(NewDownload::new("https://example.com/b"), None)
            .unwrap()
            .unwrap();
        assert!(matches!(manager.path_of(&bare.id), Err(DownloadError::NoPath(_))));
        assert!(matches!(manager.get("missing"), Err(DownloadError::NotFound(_))));
    }
}
