//! Server-side account document storage.
//!
//! One JSON document per account:
//! ```text
//! <DATA_DIR>/
//!   <account_id>.json
//! ```

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use fit_sync_core::AppState;

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Stored document could not be parsed.
    ParseError(PathBuf, serde_json::Error),
    /// Invalid account ID (e.g., contains path separators).
    InvalidAccountId(String),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::ParseError(path, e) => {
                write!(f, "Failed to parse document {}: {}", path.display(), e)
            }
            ServerStorageError::InvalidAccountId(id) => {
                write!(f, "Invalid account ID: {}", id)
            }
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::IoError(_, e) => Some(e),
            ServerStorageError::ParseError(_, e) => Some(e),
            ServerStorageError::InvalidAccountId(_) => None,
        }
    }
}

/// File-backed store of account documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Validates an account ID to prevent path traversal attacks.
    fn validate_account_id(account_id: &str) -> Result<(), ServerStorageError> {
        if account_id.is_empty()
            || account_id.contains('/')
            || account_id.contains('\\')
            || account_id.contains("..")
            || account_id.starts_with('.')
        {
            return Err(ServerStorageError::InvalidAccountId(account_id.to_string()));
        }
        Ok(())
    }

    fn doc_path(&self, account_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", account_id))
    }

    /// Loads an account's document.
    ///
    /// Returns `Ok(None)` if the account has never stored one.
    pub fn load(&self, account_id: &str) -> Result<Option<AppState>, ServerStorageError> {
        Self::validate_account_id(account_id)?;

        let path = self.doc_path(account_id);
        match fs::read(&path) {
            Ok(bytes) => {
                let state = serde_json::from_slice(&bytes)
                    .map_err(|e| ServerStorageError::ParseError(path, e))?;
                Ok(Some(state))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServerStorageError::IoError(path, e)),
        }
    }

    /// Replaces an account's document.
    pub fn save(&self, account_id: &str, state: &AppState) -> Result<(), ServerStorageError> {
        Self::validate_account_id(account_id)?;

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| ServerStorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.doc_path(account_id);
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| ServerStorageError::ParseError(path.clone(), e))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");

        let mut file = File::create(&temp_path)
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| ServerStorageError::IoError(path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::new(temp_dir.path());
        (store, temp_dir)
    }

    fn state(xp: u64) -> AppState {
        let mut state = AppState::new_user();
        state.progression.xp = xp;
        state.updated_at = 1_700_000_000_000;
        state
    }

    #[test]
    fn test_validate_account_id() {
        assert!(DocumentStore::validate_account_id("alice").is_ok());
        assert!(DocumentStore::validate_account_id("user-42_x@example.com").is_ok());

        assert!(DocumentStore::validate_account_id("").is_err());
        assert!(DocumentStore::validate_account_id("../evil").is_err());
        assert!(DocumentStore::validate_account_id("foo/bar").is_err());
        assert!(DocumentStore::validate_account_id("foo\\bar").is_err());
        assert!(DocumentStore::validate_account_id(".hidden").is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let (store, _temp) = setup();
        assert!(store.load("alice").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let (store, temp) = setup();
        store.save("alice", &state(10)).unwrap();

        assert_eq!(store.load("alice").unwrap(), Some(state(10)));
        assert!(temp.path().join("alice.json").exists());
        assert!(!temp.path().join("alice.json.tmp").exists());
    }

    #[test]
    fn test_accounts_are_isolated() {
        let (store, _temp) = setup();
        store.save("alice", &state(1)).unwrap();
        store.save("bob", &state(2)).unwrap();

        assert_eq!(store.load("alice").unwrap().unwrap().progression.xp, 1);
        assert_eq!(store.load("bob").unwrap().unwrap().progression.xp, 2);
    }

    #[test]
    fn test_overwrite_existing() {
        let (store, _temp) = setup();
        store.save("alice", &state(1)).unwrap();
        store.save("alice", &state(2)).unwrap();

        assert_eq!(store.load("alice").unwrap().unwrap().progression.xp, 2);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let (store, temp) = setup();
        fs::write(temp.path().join("alice.json"), b"{not json").unwrap();

        assert!(matches!(
            store.load("alice"),
            Err(ServerStorageError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_invalid_id_rejected_before_io() {
        let (store, _temp) = setup();
        assert!(matches!(
            store.save("../escape", &state(1)),
            Err(ServerStorageError::InvalidAccountId(_))
        ));
    }
}
