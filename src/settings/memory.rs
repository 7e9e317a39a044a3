use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{SettingsEntry, SettingsStore, StoreError};

/// Process-local store, used by tests and `serve --ephemeral`.
#[derive(Default)]
pub struct MemorySettingsStore {
    entries: RwLock<HashMap<String, (serde_json::Value, u64)>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<SettingsEntry, StoreError> {
        let entries = self.entries.read().await;
        Ok(match entries.get(key) {
            Some((value, version)) => SettingsEntry {
                key: key.to_string(),
                value: value.clone(),
                version: *version,
            },
            None => SettingsEntry::missing(key),
        })
    }

    async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let current = entries.get(key).map(|(_, v)| *v).unwrap_or(0);

        if current != expected_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                current,
            });
        }

        let next = current + 1;
        entries.insert(key.to_string(), (value, next));
        debug!("Setting '{}' written at version {}", key, next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_cas_versions() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get("k").await.unwrap().version, 0);

        let v1 = store.put("k", json!([1]), 0).await.unwrap();
        assert_eq!(v1, 1);

        let stale = store.put("k", json!([2]), 0).await;
        assert!(matches!(stale, Err(StoreError::Conflict { current: 1, .. })));

        let v2 = store.put("k", json!([3]), 1).await.unwrap();
        assert_eq!(v2, 2);
        assert_eq!(store.get("k").await.unwrap().value, json!([3]));
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemorySettingsStore::new();
        tokio_test::block_on(async {
            tokio_test::assert_ok!(store.put("a", json!(1), 0).await);
            tokio_test::assert_ok!(store.put("b", json!(2), 0).await);
            tokio_test::assert_ok!(store.put("a", json!(3), 1).await);

            assert_eq!(store.get("a").await.unwrap().version, 2);
            assert_eq!(store.get("b").await.unwrap().version, 1);
            assert_eq!(store.get("c").await.unwrap().value, serde_json::Value::Null);
        });
    }
}
