//! Flat-file JSON stores
//!
//! Each store is a single pretty-printed JSON array that is only ever appended
//! to, read whole, or deleted.

pub mod history;
pub mod personas;
pub mod references;
pub mod usage;

pub use history::{history_context, ChatHistory};
pub use personas::PersonaStore;
pub use references::{load_references, references_context};
pub use usage::{UsageLog, UsageSummary};

use crate::utils::error::AppResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// JSON array file of `T` records
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            write_lock: self.write_lock.clone(),
            _records: PhantomData,
        }
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records; a missing or blank file reads as empty
    pub fn load(&self) -> AppResult<Vec<T>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&data)?)
    }

    /// Append one record, rewriting the file atomically
    pub fn append(&self, record: T) -> AppResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut records = self.load()?;
        records.push(record);
        self.write_all(&records)?;

        debug!("Appended record to {:?} ({} total)", self.path, records.len());
        Ok(())
    }

    /// Delete the backing file; a missing file is not an error
    pub fn clear(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, records: &[T]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<String> = JsonStore::new(dir.path().join("none.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<u32> = JsonStore::new(dir.path().join("nested").join("numbers.json"));

        store.append(1).unwrap();
        store.append(2).unwrap();

        assert_eq!(store.load().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let store: JsonStore<u32> = JsonStore::new(&path);
        assert!(matches!(store.load(), Err(AppError::Serialization(_))));
        assert!(store.append(3).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<u32> = JsonStore::new(dir.path().join("n.json"));

        store.append(7).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
