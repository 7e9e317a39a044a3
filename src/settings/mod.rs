pub mod memory;
pub mod rest;
pub mod sqlite;

pub use memory::*;
pub use rest::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::Tier;

/// A named JSON blob and its write version. Version 0 means never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub version: u64,
}

impl SettingsEntry {
    pub fn missing(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: serde_json::Value::Null,
            version: 0,
        }
    }

    pub fn etag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key.as_bytes());
        hasher.update(self.version.to_be_bytes());
        hasher.update(self.value.to_string().as_bytes());
        format!("\"{}\"", hex::encode(hasher.finalize()))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version conflict on '{key}': expected {expected}, current {current}")]
    Conflict { key: String, expected: u64, current: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rejected by store: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("malformed settings data: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

/// Key-value settings persistence with compare-and-swap writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current value; a missing key yields `SettingsEntry::missing`.
    async fn get(&self, key: &str) -> Result<SettingsEntry, StoreError>;

    /// Replace the value if the stored version still equals `expected_version`.
    /// Returns the new version.
    async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
        expected_version: u64,
    ) -> Result<u64, StoreError>;
}

/// Decode a tier table blob. `null` is an empty table.
pub fn decode_tiers(value: &serde_json::Value) -> Result<Vec<Tier>, StoreError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value.clone())?)
}

/// Fetch the tier table together with its version.
pub async fn load_tiers(store: &dyn SettingsStore, key: &str) -> Result<(Vec<Tier>, u64), StoreError> {
    let entry = store.get(key).await?;
    let tiers = decode_tiers(&entry.value)?;
    Ok((tiers, entry.version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_null_is_empty() {
        assert!(decode_tiers(&serde_json::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode_tiers(&json!({"not": "a list"})).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn test_etag_changes_with_version() {
        let a = SettingsEntry { key: "k".into(), value: json!([1]), version: 1 };
        let b = SettingsEntry { version: 2, ..a.clone() };
        assert_ne!(a.etag(), b.etag());
        assert_eq!(a.etag(), a.clone().etag());
        assert!(a.etag().starts_with('"'));
    }
}
