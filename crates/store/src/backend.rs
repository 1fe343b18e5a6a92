//! Raw storage abstraction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Storage operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend refused the write for lack of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The backend is unusable (detached, poisoned, permission-denied).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized for storage.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Flat string key/value storage.
///
/// Mirrors the Web Storage surface so a browser host can delegate straight
/// to `localStorage`; non-browser targets supply [`MemoryBackend`].
pub trait StorageBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
    /// All keys currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S> StorageBackend for Arc<S>
where
    S: StorageBackend + ?Sized,
{
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).save(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// In-memory storage backend for tests/dev.
///
/// An optional byte quota makes it possible to exercise quota-exhaustion
/// paths deterministically.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects writes once total stored bytes would exceed
    /// `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;

        if let Some(quota) = self.quota_bytes {
            let existing = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let after = Self::used_bytes(&entries) - existing + key.len() + value.len();
            if after > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_delete_round_trip() {
        let backend = MemoryBackend::new();
        backend.save("a", "1").unwrap();
        assert_eq!(backend.load("a").unwrap().as_deref(), Some("1"));

        backend.delete("a").unwrap();
        assert_eq!(backend.load("a").unwrap(), None);
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let backend = MemoryBackend::with_quota(8);
        backend.save("k", "12345").unwrap(); // 6 bytes

        let err = backend.save("x", "too big").unwrap_err();
        assert_eq!(err, StorageError::QuotaExceeded);

        // Overwriting the existing key within budget still works.
        backend.save("k", "123456").unwrap();
    }
}
