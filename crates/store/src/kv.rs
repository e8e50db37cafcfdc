//! Fail-soft key/value storage for small client preferences.
//!
//! Reads never fail: a missing key, an unavailable backend or an
//! undecodable value all come back as `None`. Writes report a [`KvError`].

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::KvError;

pub const MAX_KEY_LEN: usize = 128;

pub trait KeyValueStore: Send + Sync {
    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), KvError>;
}

fn check_key(key: &str) -> Result<(), KvError> {
    if key.trim().is_empty() {
        return Err(KvError::InvalidKey("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(KvError::InvalidKey(format!(
            "key must be at most {MAX_KEY_LEN} bytes"
        )));
    }
    Ok(())
}

/// Decode a JSON value; decode failures read as absent.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding undecodable stored value");
            None
        }
    }
}

pub fn set_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), KvError> {
    let raw = serde_json::to_string(value).map_err(|e| KvError::Encode(e.to_string()))?;
    store.set(key, &raw)
}

/// Process-local store for tests/dev.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn is_available(&self) -> bool {
        !self.inner.is_poisoned()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        check_key(key)?;
        let mut map = self.inner.write().map_err(|_| KvError::Unavailable)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut map = self.inner.write().map_err(|_| KvError::Unavailable)?;
        map.remove(key);
        Ok(())
    }
}

/// JSON-file backed store.
///
/// The whole map is rewritten on every change (temp file + rename). If the
/// file's directory is not writable when the store is opened it stays
/// unavailable for its lifetime. An existing file is never written until the
/// first change, even when it could not be parsed.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    available: bool,
    inner: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable preferences file");
                BTreeMap::new()
            }
        };
        let available = match check_writable(&path) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "preferences storage unavailable");
                false
            }
        };
        Self {
            path,
            available,
            inner: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), KvError> {
        if !self.available {
            return Err(KvError::Unavailable);
        }
        let mut map = self.inner.write().map_err(|_| KvError::Unavailable)?;
        let mut next = map.clone();
        f(&mut next);
        persist(&self.path, &next)?;
        *map = next;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn is_available(&self) -> bool {
        self.available
    }

    fn get(&self, key: &str) -> Option<String> {
        if !self.available {
            return None;
        }
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        check_key(key)?;
        self.mutate(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        self.mutate(|map| {
            map.remove(key);
        })
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, String>, KvError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let file = File::open(path).map_err(|e| KvError::Io(format!("open {}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| KvError::Io(format!("parse {}: {e}", path.display())))
}

/// Create and remove a sibling file next to `path`.
fn check_writable(path: &Path) -> Result<(), KvError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| KvError::Io(format!("create {}: {e}", parent.display())))?;
    }
    let check = path.with_extension("json.wcheck");
    File::create(&check).map_err(|e| KvError::Io(format!("create write-check file: {e}")))?;
    fs::remove_file(&check).map_err(|e| KvError::Io(format!("remove write-check file: {e}")))
}

fn persist(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), KvError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| KvError::Io(format!("create {}: {e}", parent.display())))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path).map_err(|e| KvError::Io(format!("create temp file: {e}")))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, entries).map_err(|e| KvError::Encode(e.to_string()))?;
    writer.flush().map_err(|e| KvError::Io(format!("flush: {e}")))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        KvError::Io(format!("rename temp file: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        collapsed: bool,
    }

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryKeyValueStore::new();
        assert!(store.is_available());
        assert_eq!(store.get("tema"), None);

        store.set("tema", "oscuro").unwrap();
        assert_eq!(store.get("tema").as_deref(), Some("oscuro"));

        store.remove("tema").unwrap();
        store.remove("tema").unwrap();
        assert_eq!(store.get("tema"), None);
    }

    #[test]
    fn keys_are_validated() {
        let store = MemoryKeyValueStore::new();
        assert!(matches!(store.set("", "x"), Err(KvError::InvalidKey(_))));
        let long = "k".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(store.set(&long, "x"), Err(KvError::InvalidKey(_))));
    }

    #[test]
    fn json_helpers_swallow_decode_errors() {
        let store = MemoryKeyValueStore::new();
        let prefs = Prefs {
            theme: "claro".to_string(),
            collapsed: true,
        };
        set_json(&store, "prefs", &prefs).unwrap();
        assert_eq!(get_json::<Prefs>(&store, "prefs"), Some(prefs));

        store.set("prefs", "{not json").unwrap();
        assert_eq!(get_json::<Prefs>(&store, "prefs"), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = FileKeyValueStore::open(&path);
        assert!(store.is_available());
        store.set("mes", "2026-03").unwrap();
        store.set("vista", "deudas").unwrap();
        store.remove("vista").unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path);
        assert_eq!(reopened.get("mes").as_deref(), Some("2026-03"));
        assert_eq!(reopened.get("vista"), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileKeyValueStore::open(&path);
        assert!(store.is_available());
        assert_eq!(store.get("anything"), None);
        // Left alone until something is written.
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json at all");
        assert!(!path.with_extension("json.wcheck").exists());

        store.set("tema", "claro").unwrap();
        let reopened = FileKeyValueStore::open(&path);
        assert_eq!(reopened.get("tema").as_deref(), Some("claro"));
    }

    #[test]
    fn opening_does_not_create_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        let store = FileKeyValueStore::open(&path);
        assert!(store.is_available());
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_location_is_unavailable_not_fatal() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let store = FileKeyValueStore::open(blocker.join("prefs.json"));

        assert!(!store.is_available());
        assert_eq!(store.get("k"), None);
        assert_eq!(store.set("k", "v"), Err(KvError::Unavailable));
        assert_eq!(store.remove("k"), Err(KvError::Unavailable));
    }
}
