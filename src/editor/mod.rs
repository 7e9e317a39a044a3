use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::notifications::{AlertType, NotificationManager};
use crate::settings::{decode_tiers, SettingsStore, StoreError};
use crate::tiers::{sort_tiers, validate_table, FieldError, ValidationError};
use crate::types::{Tier, TierField, TierId};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("tier not found: {0}")]
    TierNotFound(TierId),

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error("tier table changed since it was loaded (version {expected} -> {current}); reload and retry")]
    Conflict { expected: u64, current: u64 },

    #[error("settings store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EditorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { expected, current, .. } => EditorError::Conflict { expected, current },
            other => EditorError::Store(other),
        }
    }
}

impl EditorError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            EditorError::Validation(v) => v.errors(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
struct WorkingSet {
    tiers: Vec<Tier>,
    version: u64,
    dirty: bool,
    /// Bumped on every local edit.
    generation: u64,
}

impl WorkingSet {
    fn touch(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }
}

/// Snapshot of the editor for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorView {
    pub tiers: Vec<Tier>,
    pub version: u64,
    pub dirty: bool,
    pub saving: bool,
}

/// Admin-side CRUD over the tier table. Edits stay local until `save`.
pub struct TierEditor {
    store: Arc<dyn SettingsStore>,
    key: String,
    working: RwLock<WorkingSet>,
    saving: AtomicBool,
    notifications: Option<Arc<NotificationManager>>,
}

/// Clears the in-flight flag when a save finishes or is dropped.
struct SaveGuard<'a>(&'a AtomicBool);

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TierEditor {
    pub fn new(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            working: RwLock::new(WorkingSet::default()),
            saving: AtomicBool::new(false),
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, notifications: Arc<NotificationManager>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    async fn notify(&self, alert: AlertType) {
        if let Some(n) = &self.notifications {
            n.notify(alert).await;
        }
    }

    /// Replace the working set with the stored table. Missing or malformed
    /// data loads as an empty table; the error is still returned.
    pub async fn load(&self) -> Result<usize, EditorError> {
        let entry = match self.store.get(&self.key).await {
            Ok(entry) => entry,
            Err(e) => {
                self.notify(AlertType::FetchFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                })
                .await;
                return Err(e.into());
            }
        };

        let (tiers, result) = match decode_tiers(&entry.value) {
            Ok(tiers) => {
                let count = tiers.len();
                (tiers, Ok(count))
            }
            Err(e) => {
                warn!("Stored tier table under '{}' is malformed: {}", self.key, e);
                self.notify(AlertType::FetchFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                })
                .await;
                (Vec::new(), Err(EditorError::Store(e)))
            }
        };

        let count = tiers.len();
        {
            let mut working = self.working.write().await;
            working.tiers = tiers;
            working.version = entry.version;
            working.dirty = false;
            working.generation += 1;
        }

        if result.is_ok() {
            debug!("Loaded {} tiers from '{}' at version {}", count, self.key, entry.version);
            self.notify(AlertType::TiersLoaded {
                count,
                version: entry.version,
            })
            .await;
        }
        result
    }

    pub async fn view(&self) -> EditorView {
        let working = self.working.read().await;
        EditorView {
            tiers: working.tiers.clone(),
            version: working.version,
            dirty: working.dirty,
            saving: self.is_saving(),
        }
    }

    pub async fn tiers(&self) -> Vec<Tier> {
        self.working.read().await.tiers.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Append a tier to the working set. Returns its id.
    pub async fn add_tier(&self, tier: Tier) -> TierId {
        let id = tier.id.clone();
        let mut working = self.working.write().await;
        working.tiers.push(tier);
        working.touch();
        id
    }

    pub async fn remove_tier(&self, id: &TierId) -> Result<Tier, EditorError> {
        let mut working = self.working.write().await;
        let pos = working
            .tiers
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| EditorError::TierNotFound(id.clone()))?;
        working.touch();
        Ok(working.tiers.remove(pos))
    }

    pub async fn edit_tier(&self, id: &TierId, field: TierField) -> Result<(), EditorError> {
        let mut working = self.working.write().await;
        let tier = working
            .tiers
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| EditorError::TierNotFound(id.clone()))?;
        debug!("Editing tier {} field {}", id, field.name());
        field.apply(tier);
        working.touch();
        Ok(())
    }

    /// Validate, sort, write with compare-and-swap, then reload from the store.
    /// On any failure the working set is left as it was. Edits made while the
    /// write is in flight are kept and leave the editor dirty.
    pub async fn save(&self) -> Result<u64, EditorError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EditorError::SaveInProgress);
        }
        let _guard = SaveGuard(&self.saving);

        let (mut tiers, expected_version, generation) = {
            let working = self.working.read().await;
            (working.tiers.clone(), working.version, working.generation)
        };

        if let Err(e) = validate_table(&tiers) {
            self.notify(AlertType::TierValidationFailed {
                errors: e.errors().iter().map(|f| f.to_string()).collect(),
            })
            .await;
            return Err(e.into());
        }

        sort_tiers(&mut tiers);
        let count = tiers.len();
        let value = serde_json::to_value(&tiers).map_err(StoreError::from)?;

        let version = match self.store.put(&self.key, value, expected_version).await {
            Ok(version) => version,
            Err(StoreError::Conflict { key, expected, current }) => {
                self.notify(AlertType::SaveConflict { key, expected, current }).await;
                return Err(EditorError::Conflict { expected, current });
            }
            Err(e) => {
                self.notify(AlertType::SaveFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                })
                .await;
                return Err(e.into());
            }
        };

        info!("Saved {} tiers to '{}' (version {})", count, self.key, version);

        // Canonical order comes from the store, not from the local copy.
        let reloaded = match self.store.get(&self.key).await.and_then(|e| {
            let tiers = decode_tiers(&e.value)?;
            Ok((tiers, e.version))
        }) {
            Ok(reloaded) => reloaded,
            Err(e) => {
                warn!("Saved tiers but reload failed, using local copy: {}", e);
                (tiers, version)
            }
        };

        {
            let mut working = self.working.write().await;
            if working.generation == generation {
                working.tiers = reloaded.0;
                working.version = reloaded.1;
                working.dirty = false;
            } else {
                warn!("Tier table edited during save; keeping unsaved edits");
                working.version = version;
            }
        }

        self.notify(AlertType::TiersSaved { count, version }).await;
        Ok(version)
    }
}
