//! Shared UI store fed by channel subscriptions

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use harbor_ipc::{Event, EventChannel, Subscription, UiClient};

use crate::state::UiState;

pub struct UiStore {
    state: Arc<RwLock<UiState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl UiStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(UiState::new())),
            revision: Arc::new(tx),
        }
    }

    /// Subscribe to every background channel. Drop the returned
    /// subscriptions through [`UiClient::unsubscribe`] to detach.
    pub fn attach(&self, client: &UiClient) -> Vec<Subscription> {
        EventChannel::ALL
            .into_iter()
            .map(|channel| {
                let store = self.clone();
                client.subscribe(channel, move |event| {
                    store.apply(event.clone());
                    Ok(())
                })
            })
            .collect()
    }

    pub fn apply(&self, event: Event) -> bool {
        let channel = event.channel();
        let (changed, revision) = {
            let mut state = self.state.write();
            let changed = state.apply(event);
            (changed, state.revision())
        };

        if changed {
            self.revision.send_replace(revision);
        } else {
            tracing::trace!(channel = %channel, "Unchanged snapshot ignored");
        }
        changed
    }

    /// Local edit, e.g. removing a row ahead of the next broadcast
    pub fn update<T>(&self, f: impl FnOnce(&mut UiState) -> T) -> T {
        let (out, revision) = {
            let mut state = self.state.write();
            let out = f(&mut state);
            (out, state.revision())
        };
        self.revision.send_if_modified(|current| {
            if *current == revision {
                return false;
            }
            *current = revision;
            true
        });
        out
    }

    pub fn read<T>(&self, f: impl FnOnce(&UiState) -> T) -> T {
        f(&self.state.read())
    }

    pub fn snapshot(&self) -> UiState {
        self.state.read().clone()
    }

    /// Wakes whenever the state revision moves
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for UiStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for UiStore {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            revision: self.revision.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_ipc::Hub;
    use harbor_tabs::{TabId, TabList};

    fn list() -> TabList {
        TabList {
            tabs: Vec::new(),
            active_tab_id: Some(TabId(1)),
        }
    }

    #[tokio::test]
    async fn test_duplicate_broadcast_does_not_notify() {
        let (hub, _requests) = Hub::new();
        let (client, _runner) = UiClient::connect(hub.connect());
        let store = UiStore::new();
        store.attach(&client);

        let mut changes = store.changes();
        hub.broadcast(&Event::BrowserTabs(list())).unwrap();
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow_and_update(), 1);

        hub.broadcast(&Event::BrowserTabs(list())).unwrap();
        // Barrier: a distinct event that does change state
        hub.broadcast(&Event::SettingsState(
            [("k".to_string(), serde_json::json!(1))].into_iter().collect(),
        ))
        .unwrap();
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow_and_update(), 2);
        assert_eq!(store.read(|s| s.active_tab()), Some(TabId(1)));
    }

    #[test]
    fn test_local_update_bumps_revision_only_on_change() {
        let store = UiStore::new();
        let changes = store.changes();

        assert!(!store.update(|s| s.remove_download("missing")));
        assert!(!changes.has_changed().unwrap());
    }
}
