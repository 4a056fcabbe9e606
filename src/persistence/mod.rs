//! Save/load persistence
//!
//! Features:
//! - camelCase JSON snapshot matching the external save API
//! - One save slot per user id
//! - Atomic file writes (tmp → save) on native
//! - LocalStorage on the web
//!
//! The in-memory world stays authoritative: a failed save changes nothing
//! and a failed load means a fresh game.

pub mod snapshot;

use std::collections::HashMap;

pub use snapshot::{EnemySnapshot, Point, SaveSnapshot};

use crate::error::PersistenceError;

/// Keyed save-game storage
pub trait SaveStore {
    fn save(&mut self, user_id: &str, snapshot: &SaveSnapshot) -> Result<(), PersistenceError>;

    /// Most recent snapshot for `user_id`, `Ok(None)` if there is none
    fn load(&self, user_id: &str) -> Result<Option<SaveSnapshot>, PersistenceError>;
}

/// Reject ids that are empty or could escape a storage namespace
pub fn validate_user_id(user_id: &str) -> Result<(), PersistenceError> {
    let ok = !user_id.is_empty()
        && user_id.len() <= 64
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(PersistenceError::InvalidUser(user_id.to_string()))
    }
}

/// In-memory store. Snapshots are kept as JSON so a round trip behaves
/// like a real backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON for a user (e.g. a save written by another client)
    pub fn insert_raw(&mut self, user_id: &str, json: impl Into<String>) {
        self.slots.insert(user_id.to_string(), json.into());
    }
}

impl SaveStore for MemoryStore {
    fn save(&mut self, user_id: &str, snapshot: &SaveSnapshot) -> Result<(), PersistenceError> {
        validate_user_id(user_id)?;
        let json = serde_json::to_string(snapshot)?;
        self.slots.insert(user_id.to_string(), json);
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Option<SaveSnapshot>, PersistenceError> {
        validate_user_id(user_id)?;
        self.slots
            .get(user_id)
            .map(|json| serde_json::from_str(json).map_err(PersistenceError::from))
            .transpose()
    }
}

/// One `<user>.json` file per user in a directory
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonFileStore {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, user_id: &str) -> std::path::PathBuf {
        self.dir.join(format!("{}.json", user_id))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SaveStore for JsonFileStore {
    fn save(&mut self, user_id: &str, snapshot: &SaveSnapshot) -> Result<(), PersistenceError> {
        validate_user_id(user_id)?;
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        let path = self.path(user_id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        log::debug!("Wrote save {}", path.display());
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Option<SaveSnapshot>, PersistenceError> {
        validate_user_id(user_id)?;
        let json = match std::fs::read_to_string(self.path(user_id)) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}

/// Browser LocalStorage, one key per user
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    const KEY_PREFIX: &'static str = "debug_defender_save_";

    fn key(user_id: &str) -> String {
        format!("{}{}", Self::KEY_PREFIX, user_id)
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn save(&mut self, user_id: &str, snapshot: &SaveSnapshot) -> Result<(), PersistenceError> {
        validate_user_id(user_id)?;
        let json = serde_json::to_string(snapshot)?;
        crate::platform::storage::write(&Self::key(user_id), &json)
    }

    fn load(&self, user_id: &str) -> Result<Option<SaveSnapshot>, PersistenceError> {
        validate_user_id(user_id)?;
        match crate::platform::storage::read(&Self::key(user_id))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::World;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load("alice").unwrap().is_none());

        let snapshot = SaveSnapshot::capture(&World::new(1));
        store.save("alice", &snapshot).unwrap();
        assert_eq!(store.load("alice").unwrap(), Some(snapshot));
    }

    #[test]
    fn test_corrupt_save_is_an_error() {
        let mut store = MemoryStore::new();
        store.insert_raw("bob", "{not json");
        assert!(matches!(store.load("bob"), Err(PersistenceError::Json(_))));
    }

    #[test]
    fn test_user_id_validation() {
        assert!(validate_user_id("player_1").is_ok());
        assert!(matches!(validate_user_id(""), Err(PersistenceError::InvalidUser(_))));
        assert!(validate_user_id("../etc/passwd").is_err());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("debug-defender-test-{}", std::process::id()));
        let mut store = JsonFileStore::new(&dir);
        assert!(store.load("carol").unwrap().is_none());

        let snapshot = SaveSnapshot::capture(&World::new(2));
        store.save("carol", &snapshot).unwrap();
        assert_eq!(store.load("carol").unwrap(), Some(snapshot));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
