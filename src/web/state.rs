use std::sync::Arc;

use crate::config::AuthSettings;
use crate::notifications::NotificationManager;
use crate::settings::SettingsStore;
use crate::tiers::BadgeCatalog;

/// Combined application state for the web server
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SettingsStore>,
    pub auth: Arc<AuthSettings>,
    pub badges: Arc<BadgeCatalog>,
    pub notifications: Arc<NotificationManager>,
    pub tier_key: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        auth: AuthSettings,
        notifications: Arc<NotificationManager>,
        tier_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
            badges: Arc::new(BadgeCatalog::default()),
            notifications,
            tier_key: tier_key.into(),
        }
    }
}
