use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Notification severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Warning" => Severity::Warning,
            "Critical" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

/// Toast-style events surfaced to dashboard and admin users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AlertType {
    // Tier editor
    TiersLoaded {
        count: usize,
        version: u64,
    },
    TiersSaved {
        count: usize,
        version: u64,
    },
    TierValidationFailed {
        errors: Vec<String>,
    },
    SaveConflict {
        key: String,
        expected: u64,
        current: u64,
    },
    SaveFailed {
        key: String,
        message: String,
    },
    FetchFailed {
        key: String,
        message: String,
    },

    // Settings API
    SettingUpdated {
        key: String,
        version: u64,
    },
    UnauthorizedWrite {
        key: String,
        role: String,
    },
}

impl AlertType {
    /// Get default severity for this alert type
    pub fn default_severity(&self) -> Severity {
        match self {
            AlertType::SaveFailed { .. } => Severity::Critical,
            AlertType::FetchFailed { .. } => Severity::Critical,

            AlertType::TierValidationFailed { .. } => Severity::Warning,
            AlertType::SaveConflict { .. } => Severity::Warning,
            AlertType::UnauthorizedWrite { .. } => Severity::Warning,

            _ => Severity::Info,
        }
    }

    /// Get a human-readable title for this alert
    pub fn title(&self) -> String {
        match self {
            AlertType::TiersLoaded { count, .. } => format!("Loaded {} tiers", count),
            AlertType::TiersSaved { count, .. } => format!("Saved {} tiers", count),
            AlertType::TierValidationFailed { errors } => {
                format!("Tier settings invalid ({} errors)", errors.len())
            }
            AlertType::SaveConflict { key, .. } => format!("{} was changed by someone else", key),
            AlertType::SaveFailed { key, .. } => format!("Failed to save {}", key),
            AlertType::FetchFailed { key, .. } => format!("Failed to load {}", key),
            AlertType::SettingUpdated { key, .. } => format!("Setting updated: {}", key),
            AlertType::UnauthorizedWrite { key, .. } => format!("Unauthorized write to {}", key),
        }
    }
}

/// A notification/alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub alert_type: AlertType,
    pub acknowledged: bool,
}

impl Notification {
    pub fn new(alert_type: AlertType) -> Self {
        let severity = alert_type.default_severity();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            severity,
            alert_type,
            acknowledged: false,
        }
    }
}

/// Notification manager
pub struct NotificationManager {
    notifications: Arc<RwLock<Vec<Notification>>>,
    database: Option<Arc<crate::database::Database>>,
    max_notifications: usize,
}

impl NotificationManager {
    pub fn new(database: Option<Arc<crate::database::Database>>) -> Self {
        Self {
            notifications: Arc::new(RwLock::new(Vec::new())),
            database,
            max_notifications: 500,
        }
    }

    /// Reload persisted notifications into memory, newest first.
    pub async fn restore_from_database(&self) -> anyhow::Result<usize> {
        let Some(db) = &self.database else {
            return Ok(0);
        };
        let restored = db.get_recent_notifications(self.max_notifications).await?;
        let count = restored.len();
        *self.notifications.write().await = restored;
        Ok(count)
    }

    /// Send a notification
    pub async fn notify(&self, alert_type: AlertType) {
        let notification = Notification::new(alert_type);

        let title = notification.alert_type.title();
        match notification.severity {
            Severity::Critical => error!("{} - {:?}", title, notification.alert_type),
            Severity::Warning => warn!("{} - {:?}", title, notification.alert_type),
            Severity::Info => info!("{}", title),
        }

        let mut notifications = self.notifications.write().await;
        notifications.insert(0, notification.clone());

        if notifications.len() > self.max_notifications {
            notifications.truncate(self.max_notifications);
        }
        drop(notifications);

        if let Some(db) = &self.database {
            if let Err(e) = db.insert_notification(&notification).await {
                error!("Failed to save notification to database: {}", e);
            }
        }
    }

    /// Get recent notifications
    pub async fn get_recent(&self, limit: usize) -> Vec<Notification> {
        let notifications = self.notifications.read().await;
        notifications.iter().take(limit).cloned().collect()
    }

    /// Unacknowledged warnings and errors, newest first
    pub async fn get_unacknowledged(&self) -> Vec<Notification> {
        let notifications = self.notifications.read().await;
        notifications
            .iter()
            .filter(|n| n.severity != Severity::Info && !n.acknowledged)
            .cloned()
            .collect()
    }

    /// Acknowledge a notification. Returns false for an unknown id.
    pub async fn acknowledge(&self, id: &str) -> bool {
        let mut notifications = self.notifications.write().await;
        let found = match notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.acknowledged = true;
                true
            }
            None => false,
        };
        drop(notifications);

        if found {
            if let Some(db) = &self.database {
                if let Err(e) = db.acknowledge_notification(id).await {
                    error!("Failed to acknowledge notification in database: {}", e);
                }
            }
        }
        found
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_defaults() {
        let critical = AlertType::SaveFailed {
            key: "botTierSettings".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(critical.default_severity(), Severity::Critical);

        let warning = AlertType::TierValidationFailed { errors: vec!["x".to_string()] };
        assert_eq!(warning.default_severity(), Severity::Warning);

        let info = AlertType::TiersSaved { count: 3, version: 1 };
        assert_eq!(info.default_severity(), Severity::Info);
    }

    #[test]
    fn test_severity_parse() {
        for severity in [Severity::Info, Severity::Warning, Severity::Critical] {
            assert_eq!(Severity::parse(severity.as_str()), severity);
        }
        assert_eq!(Severity::parse("bogus"), Severity::Info);
    }

    #[tokio::test]
    async fn test_notification_manager() {
        let manager = NotificationManager::new(None);

        manager.notify(AlertType::TiersLoaded { count: 3, version: 1 }).await;
        manager
            .notify(AlertType::SaveConflict {
                key: "botTierSettings".to_string(),
                expected: 1,
                current: 2,
            })
            .await;

        assert_eq!(manager.get_recent(10).await.len(), 2);

        let recent = manager.get_recent(1).await;
        assert_eq!(recent.len(), 1);
        assert!(matches!(recent[0].alert_type, AlertType::SaveConflict { .. }));

        let pending = manager.get_unacknowledged().await;
        assert_eq!(pending.len(), 1);
        assert!(manager.acknowledge(&pending[0].id).await);
        assert!(manager.get_unacknowledged().await.is_empty());
        assert!(!manager.acknowledge("missing").await);
    }

    #[tokio::test]
    async fn test_restore_from_database() {
        let db = Arc::new(crate::database::Database::in_memory().await.unwrap());

        let before = NotificationManager::new(Some(db.clone()));
        before
            .notify(AlertType::FetchFailed {
                key: "botTierSettings".to_string(),
                message: "timeout".to_string(),
            })
            .await;
        before.notify(AlertType::TiersSaved { count: 3, version: 2 }).await;

        let after = NotificationManager::new(Some(db));
        assert!(after.get_recent(10).await.is_empty());
        assert_eq!(after.restore_from_database().await.unwrap(), 2);

        let pending = after.get_unacknowledged().await;
        assert_eq!(pending.len(), 1);
        assert!(matches!(pending[0].alert_type, AlertType::FetchFailed { .. }));

        assert_eq!(NotificationManager::new(None).restore_from_database().await.unwrap(), 0);
    }
}
