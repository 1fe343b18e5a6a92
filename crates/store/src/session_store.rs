//! Namespaced, envelope-wrapped session store.

use chrono::{Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::backend::{StorageBackend, StorageError};

/// Default namespace prefix for all session keys.
pub const DEFAULT_PREFIX: &str = "madrasti_";

/// Stored envelope: the value plus the write timestamp, and an optional
/// absolute expiry for TTL entries.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Entry {
    value: JsonValue,
    timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

/// Key/value persistence with a fixed namespace prefix.
///
/// Corrupt entries read as absent, never as errors. Writes that hit the
/// backend's quota evict expired entries once and retry exactly once.
#[derive(Debug)]
pub struct SessionStore<B> {
    backend: B,
    prefix: String,
}

impl<B: StorageBackend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(backend: B, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Persist `value` under the namespaced `key`, without expiry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.write(key, value, None)
    }

    /// Persist `value` with an absolute expiry `ttl` from now.
    pub fn set_with_expiration<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let expires_at = Utc::now().timestamp() + ttl.num_seconds();
        self.write(key, value, Some(expires_at))
    }

    fn write<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expires_at: Option<i64>,
    ) -> Result<(), StorageError> {
        let entry = Entry {
            value: serde_json::to_value(value)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            timestamp: Utc::now().timestamp(),
            expires_at,
        };
        let raw = serde_json::to_string(&entry)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let namespaced = self.namespaced(key);
        match self.backend.save(&namespaced, &raw) {
            Err(StorageError::QuotaExceeded) => {
                warn!(key, "storage quota exceeded, evicting expired entries");
                self.evict_expired();
                self.backend.save(&namespaced, &raw)
            }
            other => other,
        }
    }

    /// Read the value stored under `key`.
    ///
    /// Missing, corrupt, and expired entries all read as `None`; an expired
    /// entry is deleted on the way out.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let namespaced = self.namespaced(key);
        let raw = self.backend.load(&namespaced).ok()??;

        let entry: Entry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "corrupt store entry, treating as absent");
                return None;
            }
        };

        if let Some(expires_at) = entry.expires_at {
            if expires_at < Utc::now().timestamp() {
                let _ = self.backend.delete(&namespaced);
                return None;
            }
        }

        serde_json::from_value(entry.value).ok()
    }

    /// Read the value stored under `key`, falling back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Remove one namespaced key.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(&self.namespaced(key))
    }

    /// Remove every key under this store's namespace, leaving unrelated
    /// backend data untouched.
    pub fn clear(&self) -> Result<(), StorageError> {
        for key in self.backend.keys()? {
            if key.starts_with(&self.prefix) {
                self.backend.delete(&key)?;
            }
        }
        Ok(())
    }

    /// Delete every namespaced entry whose expiry has passed.
    fn evict_expired(&self) {
        let now = Utc::now().timestamp();
        let Ok(keys) = self.backend.keys() else {
            return;
        };

        let mut evicted = 0usize;
        for key in keys {
            if !key.starts_with(&self.prefix) {
                continue;
            }
            let Ok(Some(raw)) = self.backend.load(&key) else {
                continue;
            };
            let expired = match serde_json::from_str::<Entry>(&raw) {
                Ok(entry) => entry.expires_at.is_some_and(|at| at < now),
                // Corrupt entries are dead weight, reclaim them too.
                Err(_) => true,
            };
            if expired && self.backend.delete(&key).is_ok() {
                evicted += 1;
            }
        }
        debug!(evicted, "expired entry eviction pass complete");
    }
}
