//! Key-value persistence for uploaded month datasets.
//!
//! Keys follow `sales_{month}` for normalized records and `sales_{month}_original`
//! for the records exactly as parsed. Values are JSON arrays.

use crate::error::{Result, SalesPulseError};
use crate::schema::{Month, MonthlyDataset};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

pub fn month_key(month: Month) -> String {
    format!("sales_{}", month.index())
}

pub fn original_key(month: Month) -> String {
    format!("sales_{}_original", month.index())
}

pub fn load_dataset(store: &dyn KeyValueStore, key: &str) -> Result<Option<MonthlyDataset>> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub fn save_dataset(store: &dyn KeyValueStore, key: &str, dataset: &MonthlyDataset) -> Result<()> {
    store.set(key, serde_json::to_vec(dataset)?)
}

/// In-process store. Contents vanish with the process, like a browser tab's storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SalesPulseError::IoError(poisoned()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SalesPulseError::IoError(poisoned()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

fn poisoned() -> std::io::Error {
    std::io::Error::other("store lock poisoned")
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        // Write-then-rename so a reader never sees a half-written month.
        let target = self.path_for(key);
        let staging = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&staging, value)?;
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}
