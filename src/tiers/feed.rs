use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::settings::{load_tiers, SettingsStore};
use crate::types::Tier;

/// Consumer read path: any fetch or decode failure degrades to an empty
/// table so badges simply disappear.
pub async fn load_tiers_or_empty(store: &dyn SettingsStore, key: &str) -> Vec<Tier> {
    match load_tiers(store, key).await {
        Ok((tiers, _)) => tiers,
        Err(e) => {
            warn!("Tier table '{}' unavailable, showing no tier badges: {}", key, e);
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Loading,
    Ready(Vec<Tier>),
}

/// A background tier-table fetch owned by a view. Dropping the handle aborts
/// the request if it is still in flight.
pub struct TierFetch {
    rx: watch::Receiver<FetchState>,
    task: JoinHandle<()>,
}

impl TierFetch {
    pub fn spawn(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (tx, rx) = watch::channel(FetchState::Loading);
        let task = tokio::spawn(async move {
            let tiers = load_tiers_or_empty(store.as_ref(), &key).await;
            let _ = tx.send(FetchState::Ready(tiers));
        });
        Self { rx, task }
    }

    pub fn state(&self) -> FetchState {
        self.rx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.rx.borrow(), FetchState::Loading)
    }

    /// Wait for the fetch to finish. An aborted fetch yields an empty table.
    pub async fn ready(mut self) -> Vec<Tier> {
        loop {
            if let FetchState::Ready(tiers) = &*self.rx.borrow_and_update() {
                return tiers.clone();
            }
            if self.rx.changed().await.is_err() {
                return match &*self.rx.borrow() {
                    FetchState::Ready(tiers) => tiers.clone(),
                    FetchState::Loading => Vec::new(),
                };
            }
        }
    }
}

impl Drop for TierFetch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemorySettingsStore, MockSettingsStore, SettingsEntry, StoreError};
    use crate::types::TIER_SETTINGS_KEY;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_error_degrades_to_empty() {
        let mut mock = MockSettingsStore::new();
        mock.expect_get()
            .returning(|_| Err(StoreError::Network("timed out".to_string())));
        assert!(load_tiers_or_empty(&mock, TIER_SETTINGS_KEY).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_degrades_to_empty() {
        let mut mock = MockSettingsStore::new();
        mock.expect_get().returning(|key| {
            Ok(SettingsEntry {
                key: key.to_string(),
                value: json!("not a table"),
                version: 1,
            })
        });
        assert!(load_tiers_or_empty(&mock, TIER_SETTINGS_KEY).await.is_empty());
    }

    #[tokio::test]
    async fn test_background_fetch() {
        let store = Arc::new(MemorySettingsStore::new());
        store
            .put(TIER_SETTINGS_KEY, serde_json::to_value(Tier::default_table()).unwrap(), 0)
            .await
            .unwrap();

        let fetch = TierFetch::spawn(store, TIER_SETTINGS_KEY);
        let tiers = fetch.ready().await;
        assert_eq!(tiers.len(), 3);
    }

    #[tokio::test]
    async fn test_drop_aborts_fetch() {
        let mut mock = MockSettingsStore::new();
        mock.expect_get().never();

        let fetch = TierFetch::spawn(Arc::new(mock), TIER_SETTINGS_KEY);
        assert!(fetch.is_loading());
        assert_eq!(fetch.state(), FetchState::Loading);
        drop(fetch);

        // give the runtime a chance to run the task if it had not been aborted
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
