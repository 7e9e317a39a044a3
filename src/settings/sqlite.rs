use async_trait::async_trait;
use tracing::{debug, warn};

use super::{SettingsEntry, SettingsStore, StoreError};
use crate::database::{Database, PutOutcome};

#[async_trait]
impl SettingsStore for Database {
    async fn get(&self, key: &str) -> Result<SettingsEntry, StoreError> {
        let stored = self
            .get_setting(key)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(match stored {
            Some((value, version)) => SettingsEntry {
                key: key.to_string(),
                value,
                version,
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
        let outcome = self
            .put_setting(key, &value, expected_version)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match outcome {
            PutOutcome::Written(version) => {
                debug!("Setting '{}' stored at version {}", key, version);
                Ok(version)
            }
            PutOutcome::Conflict { current } => {
                warn!(
                    "Rejected stale write to '{}': expected version {}, current {}",
                    key, expected_version, current
                );
                Err(StoreError::Conflict {
                    key: key.to_string(),
                    expected: expected_version,
                    current,
                })
            }
        }
    }
}
