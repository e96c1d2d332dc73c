//! Key-value storage trait and the file-backed implementation

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Durable string-keyed storage.
///
/// Writes are not transactional across keys; callers that own several keys
/// write them in a fixed sequence and accept a crash mid-sequence.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` when the key has never been written or was removed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a set of keys. Absent keys are not an error.
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// File-based storage: one file per key under a base directory.
#[derive(Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        // Keys are fixed identifiers, never user input; reject separators anyway.
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).await?;
        Ok(Some(contents))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;

        let path = self.key_path(key)?;
        fs::write(&path, value).await?;

        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            let path = self.key_path(key)?;
            if path.exists() {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, USER_DATA_KEY};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set(ACCESS_TOKEN_KEY, "tok-123").await.unwrap();

        let loaded = storage.get(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(loaded.as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let loaded = storage.get(REFRESH_TOKEN_KEY).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set(ACCESS_TOKEN_KEY, "tok").await.unwrap();
        storage.set(USER_DATA_KEY, "{}").await.unwrap();

        storage.remove(&SESSION_KEYS).await.unwrap();
        // Second remove with nothing stored must also succeed.
        storage.remove(&SESSION_KEYS).await.unwrap();

        assert!(storage.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
        assert!(storage.get(USER_DATA_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set(ACCESS_TOKEN_KEY, "old").await.unwrap();
        storage.set(ACCESS_TOKEN_KEY, "new").await.unwrap();

        let loaded = storage.get(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(loaded.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let result = storage.get("../escape").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
