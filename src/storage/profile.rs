use super::LocalStore;
use crate::types::constants::storage_keys;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Typed access to the persisted user profile: stable user id, unlocked
/// achievements, and the last-known progress snapshot per challenge category.
///
/// Writes are best-effort; a failing store is logged and the session carries
/// on with in-flight data only.
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn LocalStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Returns the stable user identifier, generating and persisting one on
    /// first use.
    pub fn user_id(&self) -> String {
        if let Some(raw) = self.store.get(storage_keys::USER_ID) {
            if let Ok(Value::String(id)) = serde_json::from_str(&raw) {
                return id;
            }
        }

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let id = format!("user_{}", suffix);

        self.persist(storage_keys::USER_ID, &Value::String(id.clone()));
        id
    }

    /// Unlocked achievements, oldest first.
    pub fn achievements(&self) -> Vec<Value> {
        self.store
            .get(storage_keys::ACHIEVEMENTS)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Appends an achievement unless one with the same `id` is already
    /// recorded.
    pub fn record_achievement(&self, achievement: &Value) {
        let mut achievements = self.achievements();

        let id = achievement.get("id").and_then(Value::as_str);
        if let Some(id) = id {
            if achievements
                .iter()
                .any(|a| a.get("id").and_then(Value::as_str) == Some(id))
            {
                tracing::debug!("Achievement '{}' already recorded", id);
                return;
            }
        }

        achievements.push(achievement.clone());
        self.persist(storage_keys::ACHIEVEMENTS, &Value::Array(achievements));
    }

    /// Last cached progress value per challenge category.
    pub fn progress_snapshot(&self) -> Map<String, Value> {
        self.store
            .get(storage_keys::PROGRESS_CACHE)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Caches the latest known progress for a challenge category.
    pub fn cache_progress(&self, category: &str, progress: Value) {
        let mut snapshot = self.progress_snapshot();
        snapshot.insert(category.to_string(), progress);
        self.persist(storage_keys::PROGRESS_CACHE, &Value::Object(snapshot));
    }

    fn persist(&self, key: &str, value: &Value) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to serialize '{}': {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(key, &serialized) {
            tracing::warn!("Failed to persist '{}': {}", key, e);
        }
    }
}
