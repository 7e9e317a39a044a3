use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{SettingsEntry, SettingsStore, StoreError};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Settings store reached over the platform's REST API.
#[derive(Debug, Clone)]
pub struct RestSettingsClient {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSettingsRequest {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Deserialize)]
struct AdminSettingsResponse {
    version: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    current_version: Option<u64>,
}

impl RestSettingsClient {
    pub fn new(base_url: &str, admin_key: Option<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key,
        })
    }

    /// Read-only client for public consumers.
    pub fn public_only(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        Self::new(base_url, None, timeout)
    }
}

#[async_trait]
impl SettingsStore for RestSettingsClient {
    async fn get(&self, key: &str) -> Result<SettingsEntry, StoreError> {
        let url = format!("{}/public-settings", self.base_url);
        debug!("GET {} key={}", url, key);

        let resp = self.client.get(&url).query(&[("key", key)]).send().await?;
        if !resp.status().is_success() {
            return Err(StoreError::Network(format!(
                "GET /public-settings returned {}",
                resp.status()
            )));
        }

        let entry: SettingsEntry = resp.json().await?;
        Ok(entry)
    }

    async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let admin_key = self
            .admin_key
            .as_deref()
            .ok_or_else(|| StoreError::Unauthorized("no admin credential configured".to_string()))?;

        let url = format!("{}/admin/settings", self.base_url);
        let body = AdminSettingsRequest {
            key: key.to_string(),
            value,
            version: expected_version,
        };

        let resp = self
            .client
            .post(&url)
            .header(ADMIN_KEY_HEADER, admin_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let parsed: AdminSettingsResponse = resp.json().await?;
            info!("Setting '{}' saved remotely at version {}", key, parsed.version);
            return Ok(parsed.version);
        }

        let error = resp
            .json::<ErrorResponse>()
            .await
            .unwrap_or(ErrorResponse {
                error: status.to_string(),
                current_version: None,
            });

        Err(match status {
            StatusCode::CONFLICT => StoreError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                current: error.current_version.unwrap_or_default(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(error.error),
            StatusCode::BAD_REQUEST => StoreError::Rejected(error.error),
            _ => StoreError::Network(format!("POST /admin/settings returned {}: {}", status, error.error)),
        })
    }
}
