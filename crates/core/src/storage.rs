//! File-backed key-value storage for small string values
//!
//! Plays the role of "device local storage" for the client: a flat map of
//! string keys to string values, mirrored in memory and persisted as a single
//! JSON object. Every mutation rewrites the whole file through a temp file and
//! a rename, so readers never observe a half-written pair of values.
//!
//! # Example
//!
//! ```rust,no_run
//! use macrolog_core::storage::KeyValueStore;
//!
//! let store = KeyValueStore::open("/tmp/macrolog/session.json")?;
//! store.set_many(&[("auth.access_token", "a"), ("auth.refresh_token", "r")])?;
//! assert_eq!(store.get("auth.access_token")?.as_deref(), Some("a"));
//! # Ok::<(), macrolog_core::Error>(())
//! ```

use crate::error::{Error, ErrorCode, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Default file name used inside the data directory
pub const DEFAULT_FILE_NAME: &str = "session.json";

/// Persistent string map guarded by a lock
#[derive(Debug)]
pub struct KeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl KeyValueStore {
    /// Open the store at `path`, loading existing entries if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::storage_corrupted(&path).with_source(e)
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Open the store in the platform data directory
    pub fn open_default() -> Result<Self> {
        Self::open(default_path())
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a single value
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.entries.read().map_err(|_| lock_error())?;
        Ok(guard.get(key).cloned())
    }

    /// Write a single value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    /// Write several values in one atomic update
    pub fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut guard = self.entries.write().map_err(|_| lock_error())?;
        let mut next = guard.clone();
        for (key, value) in pairs {
            next.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    /// Remove a single value
    pub fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    /// Remove several values in one atomic update
    pub fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut guard = self.entries.write().map_err(|_| lock_error())?;
        if !keys.iter().any(|k| guard.contains_key(*k)) {
            return Ok(());
        }
        let mut next = guard.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    /// Replace some keys and remove others in one atomic update
    pub fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<()> {
        let mut guard = self.entries.write().map_err(|_| lock_error())?;
        let mut next = guard.clone();
        for key in remove {
            next.remove(*key);
        }
        for (key, value) in set {
            next.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| Error::storage("Failed to serialize storage").with_source(e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        restrict_permissions(&tmp_path)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Default storage path: `<data dir>/macrolog/session.json`
pub fn default_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".macrolog"))
        .join("macrolog")
        .join(DEFAULT_FILE_NAME)
}

fn lock_error() -> Error {
    Error::new(ErrorCode::StorageLocked, "Failed to acquire storage lock")
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
