//! Session manager configuration.

use std::time::Duration;

use madrasti_store::session_store::DEFAULT_PREFIX;

/// Tunables for [`crate::SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the presence heartbeat while authenticated.
    pub heartbeat_interval: Duration,
    /// Namespace prefix for persisted session keys.
    pub storage_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(120),
            storage_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }
}
