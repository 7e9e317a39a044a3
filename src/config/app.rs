use ::config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::auth::AuthSettings;
use crate::types::TIER_SETTINGS_KEY;

pub const DEFAULT_CONFIG_FILE: &str = "tier_desk.toml";
pub const ENV_PREFIX: &str = "TIER_DESK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub settings: SettingsClientSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allow_any: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

/// Where CLI commands find the settings API, and which key holds the tier table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsClientSettings {
    pub base_url: String,
    pub tier_key: String,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl SettingsClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Defaults, then the optional config file, then `TIER_DESK__*` variables
    /// (after `.env` has been loaded).
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_allow_any", true)?
            .set_default("database.url", "sqlite:./tier_desk.db")?
            .set_default("database.max_connections", 5)?
            .set_default("settings.base_url", "http://localhost:3000")?
            .set_default("settings.tier_key", TIER_SETTINGS_KEY)?
            .set_default("settings.request_timeout_secs", 10)?
            .set_default("auth.admin_keys", Vec::<String>::new())?
            .set_default("auth.moderator_keys", Vec::<String>::new())?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_keys")
                    .with_list_parse_key("auth.moderator_keys")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be > 0".to_string());
        }
        if !self.database.url.starts_with("sqlite:") {
            errors.push("database.url must be a sqlite: URL".to_string());
        }
        if self.settings.tier_key.trim().is_empty() {
            errors.push("settings.tier_key must not be empty".to_string());
        }
        if self.settings.request_timeout_secs == 0 {
            errors.push("settings.request_timeout_secs must be > 0".to_string());
        }
        if !self.settings.base_url.starts_with("http://") && !self.settings.base_url.starts_with("https://") {
            errors.push("settings.base_url must be an http(s) URL".to_string());
        }
        if self.auth.admin_keys.iter().chain(&self.auth.moderator_keys).any(|k| k.trim().is_empty()) {
            errors.push("auth keys must not be empty strings".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_allow_any: true,
            },
            database: DatabaseSettings {
                url: "sqlite:./tier_desk.db".to_string(),
                max_connections: 5,
            },
            settings: SettingsClientSettings {
                base_url: "http://localhost:3000".to_string(),
                tier_key: TIER_SETTINGS_KEY.to_string(),
                request_timeout_secs: 10,
                admin_key: None,
            },
            auth: AuthSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = AppConfig::default();
        invalid.settings.request_timeout_secs = 0;
        invalid.database.url = "postgres://x".to_string();
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load("does-not-exist.toml").unwrap();
        assert_eq!(config.settings.tier_key, TIER_SETTINGS_KEY);
        assert!(config.settings.request_timeout_secs > 0);
    }
}
