//! Persistence boundary: a key-value store of serialized JSON addressed by
//! fixed string keys. No schema versioning beyond the normalizer's
//! defaulting; an older persisted shape loads because normalization
//! backfills missing fields.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::domain::Client;
use super::normalizer::normalize_client;
use super::seed::seed_clients;

pub const DATASET_KEY: &str = "neoPortfolio:v2";
pub const COLOR_THEME_KEY: &str = "neo_color_theme";
pub const APPEARANCE_KEY: &str = "neo_theme_preference";
pub const MEASUREMENT_UNIT_KEY: &str = "neo_measurement_unit";

/// Storage abstraction so the portfolio service can be exercised in
/// isolation.
pub trait PortfolioStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store write failed: {0}")]
    Write(String),
}

/// Load the persisted client set, normalizing every record. An absent or
/// corrupt dataset degrades to the built-in seed; this path is never fatal.
pub fn load_clients(store: &impl PortfolioStore) -> Vec<Client> {
    let raw = match store.get(DATASET_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return seed_clients(),
        Err(err) => {
            warn!(%err, "portfolio store unreadable, falling back to seed dataset");
            return seed_clients();
        }
    };

    match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(entries) => entries.iter().map(normalize_client).collect(),
        Err(err) => {
            warn!(%err, "persisted dataset is not a JSON array, falling back to seed dataset");
            seed_clients()
        }
    }
}

/// Serialize and persist the full client set under the dataset key.
pub fn save_clients(store: &impl PortfolioStore, clients: &[Client]) -> Result<(), StoreError> {
    let payload = serde_json::to_string(clients)
        .map_err(|err| StoreError::Write(err.to_string()))?;
    store.set(DATASET_KEY, &payload)
}

/// Persisted presentation preferences, one store key each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub color_theme: String,
    pub appearance: String,
    pub measurement_unit: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            color_theme: "indigo".to_string(),
            appearance: "system".to_string(),
            measurement_unit: "imperial".to_string(),
        }
    }
}

pub fn load_preferences(store: &impl PortfolioStore) -> Preferences {
    let defaults = Preferences::default();
    let read = |key: &str, fallback: &str| -> String {
        match store.get(key) {
            Ok(Some(value)) if !value.trim().is_empty() => value,
            _ => fallback.to_string(),
        }
    };

    Preferences {
        color_theme: read(COLOR_THEME_KEY, &defaults.color_theme),
        appearance: read(APPEARANCE_KEY, &defaults.appearance),
        measurement_unit: read(MEASUREMENT_UNIT_KEY, &defaults.measurement_unit),
    }
}

pub fn save_preferences(
    store: &impl PortfolioStore,
    preferences: &Preferences,
) -> Result<(), StoreError> {
    store.set(COLOR_THEME_KEY, &preferences.color_theme)?;
    store.set(APPEARANCE_KEY, &preferences.appearance)?;
    store.set(MEASUREMENT_UNIT_KEY, &preferences.measurement_unit)
}

/// Mutex-guarded map store for tests, demos, and ephemeral serving.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl PortfolioStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// One file per key under a data directory. Key characters outside
/// `[A-Za-z0-9_-]` are mapped to `_` for the filename.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

impl PortfolioStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Unavailable(err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value).map_err(|err| StoreError::Write(err.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let entries =
            fs::read_dir(&self.root).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|err| StoreError::Write(err.to_string()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_dataset_yields_seed() {
        let store = InMemoryStore::default();
        let clients = load_clients(&store);
        assert_eq!(clients[0].id, "c-001");
    }

    #[test]
    fn corrupt_dataset_yields_seed() {
        let store = InMemoryStore::default();
        store.set(DATASET_KEY, "{not json").expect("set succeeds");
        let clients = load_clients(&store);
        assert_eq!(clients[0].id, "c-001");
    }

    #[test]
    fn saved_dataset_round_trips_through_normalization() {
        let store = InMemoryStore::default();
        let clients = seed_clients();
        save_clients(&store, &clients).expect("save succeeds");
        assert_eq!(load_clients(&store), clients);
    }

    #[test]
    fn older_shape_loads_with_backfilled_fields() {
        let store = InMemoryStore::default();
        store
            .set(
                DATASET_KEY,
                r#"[{ "id": "c-9", "name": "Legacy", "assets": [{ "id": "a-9", "value": "250000" }] }]"#,
            )
            .expect("set succeeds");
        let clients = load_clients(&store);
        assert_eq!(clients[0].assets[0].value, 250_000.0);
        assert_eq!(clients[0].assets[0].asset_type, "Apartment");
        assert_eq!(clients[0].total_value, 250_000.0);
    }

    #[test]
    fn preferences_default_per_key() {
        let store = InMemoryStore::default();
        store.set(COLOR_THEME_KEY, "emerald").expect("set succeeds");
        let preferences = load_preferences(&store);
        assert_eq!(preferences.color_theme, "emerald");
        assert_eq!(preferences.appearance, "system");
        assert_eq!(preferences.measurement_unit, "imperial");
    }
}
