//! Durable key/value storage for the session token.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store persists its bearer token under [`TOKEN_KEY`] and reads
//! it back at startup. A missing key means logged out. Values are stored as
//! plain text, one file per key for [`FileStorage`].

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ClientError;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Durable string storage keyed by name.
pub trait TokenStorage: Send + Sync {
    /// Read the value for `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, ClientError>;

    /// Write `value` for `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the backing store cannot be written.
    fn store(&self, key: &str, value: &str) -> Result<(), ClientError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// One plain-text file per key inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ClientError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(ClientError::Storage(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

impl TokenStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw.trim_end_matches(['\r', '\n']).to_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, &e)),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_error("create", &self.dir, &e))?;
        std::fs::write(&path, value).map_err(|e| storage_error("write", &path, &e))?;
        restrict_permissions(&path)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, &e)),
        }
    }
}

fn storage_error(op: &str, path: &Path, err: &std::io::Error) -> ClientError {
    ClientError::Storage(format!("{op} {}: {err}", path.display()))
}

/// Tokens are credentials; keep them owner-readable only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ClientError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| storage_error("chmod", path, &e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ClientError> {
    Ok(())
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// Process-local storage for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with an initial value, as if written by a prior run.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.lock().insert(key.to_owned(), value.to_owned());
        storage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.lock().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.lock().remove(key);
        Ok(())
    }
}
