use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

use crate::notifications::{AlertType, Notification, Severity};

pub struct Database {
    pool: SqlitePool,
}

/// Outcome of a compare-and-swap settings write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Written(u64),
    Conflict { current: u64 },
}

impl Database {
    /// Initialize database with schema
    pub async fn new(db_path: &str, max_connections: u32) -> Result<Self> {
        info!("Initializing SQLite database at: {}", db_path);

        // Create database file if it doesn't exist
        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_schema().await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    /// Single-connection in-memory database; every connection would otherwise
    /// see its own empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:", 1).await
    }

    /// Create database schema
    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                version INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                severity TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                alert_data TEXT NOT NULL,
                acknowledged INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_notifications_timestamp ON notifications(timestamp DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_notifications_acknowledged ON notifications(acknowledged)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a setting as (json, version). `None` when the key was never written.
    pub async fn get_setting(&self, key: &str) -> Result<Option<(serde_json::Value, u64)>> {
        let row = sqlx::query("SELECT value, version FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                let version: i64 = row.get("version");
                Ok(Some((serde_json::from_str(&raw)?, version as u64)))
            }
            None => Ok(None),
        }
    }

    async fn current_version(&self, key: &str) -> Result<u64> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version.unwrap_or(0) as u64)
    }

    /// Replace a setting only if its stored version equals `expected_version`
    /// (0 for a key that must not exist yet).
    pub async fn put_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
        expected_version: u64,
    ) -> Result<PutOutcome> {
        let raw = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        let result = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, version, updated_at)
                VALUES (?, ?, 1, ?)
                ON CONFLICT(key) DO NOTHING
                "#,
            )
            .bind(key)
            .bind(&raw)
            .bind(&now)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE settings
                SET value = ?, version = version + 1, updated_at = ?
                WHERE key = ? AND version = ?
                "#,
            )
            .bind(&raw)
            .bind(&now)
            .bind(key)
            .bind(expected_version as i64)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 1 {
            Ok(PutOutcome::Written(expected_version + 1))
        } else {
            Ok(PutOutcome::Conflict {
                current: self.current_version(key).await?,
            })
        }
    }

    /// Keys of every stored setting
    pub async fn list_setting_keys(&self) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    pub async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let alert_type_str = notification.alert_type.title();
        let alert_data_json = serde_json::to_string(&notification.alert_type)?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, timestamp, severity, alert_type, alert_data, acknowledged)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(notification.timestamp.to_rfc3339())
        .bind(notification.severity.as_str())
        .bind(alert_type_str)
        .bind(alert_data_json)
        .bind(if notification.acknowledged { 1 } else { 0 })
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get recent notifications
    pub async fn get_recent_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, severity, alert_data, acknowledged
            FROM notifications
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::new();
        for row in rows {
            let severity_str: String = row.get("severity");
            let alert_data_json: String = row.get("alert_data");
            let alert_type: AlertType = serde_json::from_str(&alert_data_json)?;

            notifications.push(Notification {
                id: row.get("id"),
                timestamp: DateTime::parse_from_rfc3339(row.get("timestamp"))?.with_timezone(&Utc),
                severity: Severity::parse(&severity_str),
                alert_type,
                acknowledged: row.get::<i32, _>("acknowledged") == 1,
            });
        }

        Ok(notifications)
    }

    /// Acknowledge a notification
    pub async fn acknowledge_notification(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET acknowledged = 1
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop acknowledged notifications older than `keep_days`
    pub async fn cleanup_old_notifications(&self, keep_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(keep_days);

        let result = sqlx::query("DELETE FROM notifications WHERE timestamp < ? AND acknowledged = 1")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;

        info!("Cleaned up notifications older than {} days", keep_days);
        Ok(result.rows_affected())
    }
}
