//! Client view-model
//!
//! Built only from background events. Applying an event that matches what
//! is already held is a no-op, so duplicate snapshots never ripple into
//! derived state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use harbor_download::DownloadMetrics;
use harbor_ipc::{DownloadUpdate, Event, SettingsSnapshot};
use harbor_navigation::{NavHistory, TabHistories};
use harbor_privacy::{PermissionPrompt, PermissionSnapshot};
use harbor_storage::{Download, HistoryEntry};
use harbor_tabs::{NavState, TabId, TabList};

/// Most recent `history:append` entries kept for the new-tab page
pub const RECENT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tabs: TabList,
    pub nav: HashMap<TabId, NavState>,
    /// Newest first
    pub downloads: Vec<Download>,
    pub permissions: PermissionSnapshot,
    pub prompts: Vec<PermissionPrompt>,
    pub settings: SettingsSnapshot,
    pub recent_history: Vec<HistoryEntry>,
    histories: TabHistories<TabId>,
    revision: u64,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped once per event that changed something
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge one event. Returns whether anything changed.
    pub fn apply(&mut self, event: Event) -> bool {
        let changed = match event {
            Event::NavState(state) => self.apply_nav_state(state),
            Event::BrowserTabs(list) => self.apply_tab_list(list),
            Event::HistoryAppend(entry) => self.apply_history(entry),
            Event::DownloadsUpdate(update) => self.apply_download(update),
            Event::PermissionsPrompt(prompt) => {
                if self.prompts.iter().any(|p| p.request_id == prompt.request_id) {
                    false
                } else {
                    self.prompts.push(prompt);
                    true
                }
            }
            Event::PermissionsState(snapshot) => replace_if_changed(&mut self.permissions, snapshot),
            Event::SettingsState(snapshot) => replace_if_changed(&mut self.settings, snapshot),
        };

        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.tabs.active_tab_id
    }

    pub fn active_nav(&self) -> Option<&NavState> {
        self.active_tab().and_then(|id| self.nav.get(&id))
    }

    pub fn history_for(&self, tab: TabId) -> Option<&NavHistory> {
        self.histories.get(&tab)
    }

    pub fn download(&self, id: &str) -> Option<&Download> {
        self.downloads.iter().find(|d| d.id == id)
    }

    /// Rows for the downloads tray with their live metrics
    pub fn download_rows(&self, now: DateTime<Utc>) -> Vec<(&Download, DownloadMetrics)> {
        self.downloads
            .iter()
            .map(|d| (d, DownloadMetrics::of(d, now)))
            .collect()
    }

    /// Drop a download locally, ahead of the background's own broadcast
    pub fn remove_download(&mut self, id: &str) -> bool {
        let before = self.downloads.len();
        self.downloads.retain(|d| d.id != id);
        let removed = before != self.downloads.len();
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Replace the recent history list, e.g. after `history:clear` or a
    /// fresh `history:request`. Entries past the limit are dropped.
    pub fn reset_recent_history(&mut self, mut entries: Vec<HistoryEntry>) -> bool {
        entries.truncate(RECENT_HISTORY_LIMIT);
        if entries == self.recent_history {
            return false;
        }
        self.recent_history = entries;
        self.revision += 1;
        true
    }

    pub fn dismiss_prompt(&mut self, request_id: u64) -> Option<PermissionPrompt> {
        let index = self.prompts.iter().position(|p| p.request_id == request_id)?;
        self.revision += 1;
        Some(self.prompts.remove(index))
    }

    fn apply_nav_state(&mut self, state: NavState) -> bool {
        if self.nav.get(&state.tab_id) == Some(&state) {
            return false;
        }

        let moved = self.histories.observe(&state.tab_id, &state.url);
        tracing::trace!(tab_id = %state.tab_id, ?moved, "Nav state merged");
        self.nav.insert(state.tab_id, state);
        true
    }

    fn apply_tab_list(&mut self, list: TabList) -> bool {
        if self.tabs == list {
            return false;
        }

        let open = list.ids();
        self.nav.retain(|id, _| open.contains(id));
        self.histories.retain_open(&open);
        self.tabs = list;
        true
    }

    fn apply_history(&mut self, entry: HistoryEntry) -> bool {
        if self.recent_history.iter().any(|e| *e == entry) {
            return false;
        }

        self.recent_history.retain(|e| e.id != entry.id);
        self.recent_history.insert(0, entry);
        self.recent_history.truncate(RECENT_HISTORY_LIMIT);
        true
    }

    fn apply_download(&mut self, update: DownloadUpdate) -> bool {
        let DownloadUpdate { download, deleted } = update;

        if deleted {
            let before = self.downloads.len();
            self.downloads.retain(|d| d.id != download.id);
            return before != self.downloads.len();
        }

        match self.downloads.iter_mut().find(|d| d.id == download.id) {
            Some(existing) if *existing == download => return false,
            Some(existing) => *existing = download,
            None => self.downloads.push(download),
        }

        self.downloads
            .sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| b.id.cmp(&a.id)));
        true
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, next: T) -> bool {
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_storage::DownloadState;
    use harbor_tabs::TabSummary;

    fn summary(id: u64, url: &str) -> TabSummary {
        TabSummary {
            tab_id: TabId(id),
            url: url.to_string(),
            title: None,
            favicon: None,
            can_go_back: false,
            can_go_forward: false,
            is_loading: false,
            error: None,
        }
    }

    fn nav(id: u64, url: &str) -> NavState {
        NavState {
            tab_id: TabId(id),
            url: url.to_string(),
            title: None,
            favicon: None,
            can_go_back: false,
            can_go_forward: false,
            is_loading: false,
            error: None,
            session_partition: "persist:default".to_string(),
            is_incognito: false,
            is_active: true,
        }
    }

    #[test]
    fn test_identical_tab_lists_apply_once() {
        let mut state = UiState::new();
        let list = TabList {
            tabs: vec![summary(1, "https://a.test/"), summary(2, "https://b.test/")],
            active_tab_id: Some(TabId(1)),
        };

        assert!(state.apply(Event::BrowserTabs(list.clone())));
        let revision = state.revision();
        let before = state.tabs.clone();

        assert!(!state.apply(Event::BrowserTabs(list)));
        assert_eq!(state.revision(), revision);
        assert_eq!(state.tabs, before);
    }

    #[test]
    fn test_nav_states_rebuild_back_stack() {
        let mut state = UiState::new();
        state.apply(Event::NavState(nav(1, "https://a.test/")));
        state.apply(Event::NavState(nav(1, "https://a.test/next")));
        // Same url again, only the loading flag differs
        let mut loading = nav(1, "https://a.test/next");
        loading.is_loading = true;
        state.apply(Event::NavState(loading));

        let history = state.history_for(TabId(1)).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.can_back());

        state.apply(Event::NavState(nav(1, "https://a.test/")));
        assert!(state.history_for(TabId(1)).unwrap().can_forward());
    }

    #[test]
    fn test_closed_tabs_drop_their_state() {
        let mut state = UiState::new();
        state.apply(Event::NavState(nav(1, "https://a.test/")));
        state.apply(Event::NavState(nav(2, "https://b.test/")));

        state.apply(Event::BrowserTabs(TabList {
            tabs: vec![summary(2, "https://b.test/")],
            active_tab_id: Some(TabId(2)),
        }));

        assert!(state.nav.get(&TabId(1)).is_none());
        assert!(state.history_for(TabId(1)).is_none());
        assert_eq!(state.active_nav().unwrap().url, "https://b.test/");
    }

    #[test]
    fn test_download_updates_merge_and_delete() {
        let mut state = UiState::new();
        let mut download = Download::new("d1", "https://files.test/a.bin");

        assert!(state.apply(Event::DownloadsUpdate(DownloadUpdate::changed(download.clone()))));
        assert!(!state.apply(Event::DownloadsUpdate(DownloadUpdate::changed(download.clone()))));

        download.bytes_received = 10;
        download.state = DownloadState::Paused;
        assert!(state.apply(Event::DownloadsUpdate(DownloadUpdate::changed(download.clone()))));
        assert_eq!(state.downloads.len(), 1);
        assert_eq!(state.download("d1").unwrap().bytes_received, 10);

        let rows = state.download_rows(Utc::now());
        assert_eq!(rows[0].1.throughput, None);

        assert!(state.apply(Event::DownloadsUpdate(DownloadUpdate::deleted(download.clone()))));
        assert!(!state.apply(Event::DownloadsUpdate(DownloadUpdate::deleted(download))));
        assert!(state.downloads.is_empty());
    }

    #[test]
    fn test_prompts_are_deduplicated() {
        let mut state = UiState::new();
        let prompt = PermissionPrompt {
            origin: "https://a.test".to_string(),
            permission: harbor_privacy::PermissionKind::Camera,
            request_id: 4,
        };

        assert!(state.apply(Event::PermissionsPrompt(prompt.clone())));
        assert!(!state.apply(Event::PermissionsPrompt(prompt)));
        assert!(state.dismiss_prompt(4).is_some());
        assert!(state.prompts.is_empty());
    }

    #[test]
    fn test_reset_recent_history_drops_stale_entries() {
        let mut state = UiState::new();
        for id in 0..3 {
            state.apply(Event::HistoryAppend(HistoryEntry {
                id,
                url: format!("https://site.test/{id}"),
                title: None,
                visit_time: Utc::now(),
                transition: None,
                referrer: None,
                visit_id: None,
            }));
        }
        let revision = state.revision();

        assert!(state.reset_recent_history(Vec::new()));
        assert!(state.recent_history.is_empty());
        assert_eq!(state.revision(), revision + 1);
        assert!(!state.reset_recent_history(Vec::new()));
        assert_eq!(state.revision(), revision + 1);
    }
}
