use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for access control.
///
/// Roles are intentionally opaque strings at this layer (`"ADMIN"`,
/// `"TEACHER"`, `"STUDENT"`, `"PARENT"`); mapping roles to navigation or
/// policy is done by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Fallback role assigned when a token carries no role claim.
    pub fn student() -> Self {
        Self(Cow::Borrowed("STUDENT"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::student()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
