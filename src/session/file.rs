//! JSON file token store for the terminal shell.
//!
//! File layout is a single flat object:
//! ```text
//! { "jwt_token": "<header>.<payload>.<signature>" }
//! ```
//! The file is re-read on every access so separate processes sharing it
//! observe each other's logins and logouts. Writes go to a sibling temp
//! file which is then renamed over the original.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::TokenStore;

type Entries = BTreeMap<String, String>;

/// File-backed key/value store.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Entries {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Entries::new(),
            Err(e) => {
                tracing::error!("Failed to read token store {}: {}", self.path.display(), e);
                return Entries::new();
            }
        };

        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                "Token store {} is not a JSON object, ignoring it: {}",
                self.path.display(),
                e
            );
            Entries::new()
        })
    }

    fn write_entries(&self, entries: &Entries) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn update(&self, apply: impl FnOnce(&mut Entries)) {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_entries();
        apply(&mut entries);
        if let Err(e) = self.write_entries(&entries) {
            tracing::error!("Failed to write token store {}: {}", self.path.display(), e);
        }
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_entries().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        if !self.path.exists() {
            return;
        }
        self.update(|entries| {
            entries.remove(key);
        });
    }
}
