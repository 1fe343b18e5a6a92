//! Session state as observed by consumers.

use serde::{Deserialize, Serialize};

use madrasti_core::{AuthError, UserProfile};

/// Coarse session lifecycle state.
///
/// `Error` is transient: it always settles to `Unauthenticated` once
/// storage has been cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    Authenticated,
    Unauthenticated,
    Error,
}

/// Full in-memory session, owned by the manager.
///
/// Invariant: `status == Authenticated` iff `user` and `access_token` are
/// both present (and the token was unexpired at last check).
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error: Option<AuthError>,
}

impl SessionState {
    pub fn initializing() -> Self {
        Self {
            status: SessionStatus::Initializing,
            user: None,
            access_token: None,
            refresh_token: None,
            error: None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            user: self.user.clone(),
            error: self.error.clone(),
        }
    }
}

/// What guards and UI callers get to see.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
    pub error: Option<AuthError>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Still restoring the persisted session; no redirect decision yet.
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Initializing
    }
}
