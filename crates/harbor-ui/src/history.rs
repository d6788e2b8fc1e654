//! History panel actions
//!
//! The background only broadcasts appends, so anything that shrinks the
//! history (a clear, retention sweeps) reaches this UI through these calls.

use harbor_ipc::{Command, HistoryQuery, UiClient};
use harbor_storage::HistoryEntry;

use crate::state::RECENT_HISTORY_LIMIT;
use crate::store::UiStore;
use crate::Result;

#[derive(Clone)]
pub struct HistoryActions {
    client: UiClient,
    store: UiStore,
}

impl HistoryActions {
    pub fn new(client: UiClient, store: UiStore) -> Self {
        Self { client, store }
    }

    /// Clear stored history. The local list empties only once the
    /// background confirms.
    pub async fn clear(&self) -> Result<()> {
        if let Err(e) = self.client.invoke(Command::ClearHistory).await {
            tracing::warn!(error = %e, "Clearing history failed");
            return Err(e.into());
        }
        self.store.update(|state| state.reset_recent_history(Vec::new()));
        Ok(())
    }

    /// Reload the recent list from storage
    pub async fn refresh(&self) -> Result<usize> {
        let value = self
            .client
            .invoke(Command::RequestHistory(HistoryQuery {
                limit: Some(RECENT_HISTORY_LIMIT),
            }))
            .await?;
        let entries: Vec<HistoryEntry> = serde_json::from_value(value)?;
        let count = entries.len();
        self.store.update(|state| state.reset_recent_history(entries));
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use harbor_ipc::{CommandResult, Event, Hub, IpcError, RequestReceiver};

    use crate::error::UiError;

    fn setup() -> (Hub, RequestReceiver, HistoryActions, UiStore) {
        let (hub, requests) = Hub::new();
        let (client, _runner) = UiClient::connect(hub.connect());
        let store = UiStore::new();
        (hub, requests, HistoryActions::new(client, store.clone()), store)
    }

    fn entry(id: i64, url: &str) -> HistoryEntry {
        HistoryEntry {
            id,
            url: url.to_string(),
            title: None,
            visit_time: Utc::now(),
            transition: None,
            referrer: None,
            visit_id: None,
        }
    }

    #[tokio::test]
    async fn test_clear_empties_recent_list() {
        let (hub, mut requests, actions, store) = setup();
        store.apply(Event::HistoryAppend(entry(1, "https://a.test/")));
        store.apply(Event::HistoryAppend(entry(2, "https://b.test/")));
        let revision = store.read(|s| s.revision());

        let background = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            assert_eq!(request.command, Command::ClearHistory);
            hub.reply(&request, CommandResult::ok(serde_json::Value::Null));
        });

        actions.clear().await.unwrap();
        background.await.unwrap();
        assert!(store.read(|s| s.recent_history.is_empty()));
        assert_eq!(store.read(|s| s.revision()), revision + 1);
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_list() {
        let (hub, mut requests, actions, store) = setup();
        store.apply(Event::HistoryAppend(entry(1, "https://a.test/")));

        let background = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            hub.reply(&request, CommandResult::err("database is locked".to_string()));
        });

        let err = actions.clear().await.unwrap_err();
        assert!(matches!(err, UiError::Ipc(IpcError::CommandFailed(_))));
        assert_eq!(store.read(|s| s.recent_history.len()), 1);
        background.await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_replaces_stale_entries() {
        let (hub, mut requests, actions, store) = setup();
        store.apply(Event::HistoryAppend(entry(1, "https://gone.test/")));

        let background = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            let fresh = vec![entry(7, "https://kept.test/")];
            hub.reply(&request, CommandResult::ok(serde_json::to_value(fresh).unwrap()));
        });

        assert_eq!(actions.refresh().await.unwrap(), 1);
        background.await.unwrap();
        let urls: Vec<String> = store.read(|s| s.recent_history.iter().map(|e| e.url.clone()).collect());
        assert_eq!(urls, vec!["https://kept.test/"]);
    }
}
