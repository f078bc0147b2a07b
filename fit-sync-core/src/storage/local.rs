//! File-backed key/value storage.
//!
//! Each key is stored as `<data_dir>/<key>.json`. Writes go through a temp
//! file and a rename so a crash never leaves a half-written record.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

const RECORD_EXTENSION: &str = "json";

/// Errors that can occur during local storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to parse record {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Key/value storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Rejects keys that could escape the data directory.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Returns the full path for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    pub fn exists(&self, key: &str) -> bool {
        Self::validate_key(key).is_ok() && self.path(key).exists()
    }

    /// Reads a record.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    pub fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Self::validate_key(key)?;
        let path = self.path(key);

        match fs::read(&path) {
            Ok(bytes) => {
                let value =
                    serde_json::from_slice(&bytes).map_err(|e| StorageError::Parse(path, e))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }

    /// Writes a record, creating the data directory if needed.
    pub fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        Self::validate_key(key)?;

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let temp_path = path.with_extension("json.tmp");

        // serde_json::Value always serializes.
        let bytes = serde_json::to_vec_pretty(value).unwrap_or_default();

        let mut file =
            File::create(&temp_path).map_err(|e| StorageError::Io(temp_path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| StorageError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| StorageError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| StorageError::Io(path, e))?;

        Ok(())
    }

    /// Removes a record. Returns `Ok(false)` if it didn't exist.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Self::validate_key(key)?;
        let path = self.path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }
}
