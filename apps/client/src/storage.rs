//! Small persistent key/value store for client-side hints.
//!
//! Nothing stored here is authoritative: every value is a bias that callers
//! validate against fresh server data before use.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::models::space::SpaceId;

/// Id of the last space the user explicitly chose.
pub const ACTIVE_SPACE_KEY: &str = "currentSpaceId";
/// Plain boolean recorded on login / logout.
pub const LOGIN_HINT_KEY: &str = "isLoggedIn";

pub trait HintStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Reads the active-space hint. Missing or unparsable values are a hint miss.
pub fn read_space_hint(store: &dyn HintStore) -> Option<SpaceId> {
    store
        .get(ACTIVE_SPACE_KEY)
        .and_then(|raw| raw.trim().parse::<SpaceId>().ok())
}

pub fn write_space_hint(store: &dyn HintStore, id: SpaceId) {
    if let Err(e) = store.set(ACTIVE_SPACE_KEY, &id.to_string()) {
        warn!("Failed to persist active space hint {id}: {e}");
    }
}

pub fn clear_space_hint(store: &dyn HintStore) {
    if let Err(e) = store.remove(ACTIVE_SPACE_KEY) {
        warn!("Failed to clear active space hint: {e}");
    }
}

pub fn write_login_hint(store: &dyn HintStore, logged_in: bool) {
    if let Err(e) = store.set(LOGIN_HINT_KEY, if logged_in { "true" } else { "false" }) {
        warn!("Failed to persist login hint: {e}");
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MemoryHintStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryHintStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HintStore for MemoryHintStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Hint store backed by a flat JSON object on disk.
///
/// The file is read once at open and rewritten in full on every change.
pub struct FileHintStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileHintStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable hint file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => {
                debug!("No hint file at {}, starting empty", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write never leaves a truncated hint file behind.
    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(values)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl HintStore for FileHintStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}
