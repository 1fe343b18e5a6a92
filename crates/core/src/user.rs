//! User identity as seen by the session subsystem.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Identifier of a user account.
///
/// The identity service issues numeric ids inside token claims; this newtype
/// keeps them from mixing with other integers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(i64::from_str(s)?))
    }
}

/// The authenticated user as held by the session and mirrored to storage.
///
/// Replaced wholesale on login/refresh, patched on profile edits, cleared on
/// logout. The session state machine is the sole owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub force_password_change: bool,
}

impl UserProfile {
    /// Shallow-merge a patch into this profile. `None` fields are untouched.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(full_name) = patch.full_name {
            self.full_name = full_name;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(permissions) = patch.permissions {
            self.permissions = permissions;
        }
        if let Some(force) = patch.force_password_change {
            self.force_password_change = force;
        }
    }
}

/// Partial profile update (profile edits that do not touch tokens).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<Vec<Permission>>,
    pub force_password_change: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new(7),
            email: "t@x.com".to_string(),
            full_name: "Test Teacher".to_string(),
            first_name: "Test".to_string(),
            last_name: "Teacher".to_string(),
            role: Role::new("TEACHER"),
            permissions: vec![Permission::new("assignments.grade")],
            force_password_change: false,
        }
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut user = profile();
        user.apply(UserPatch {
            full_name: Some("Renamed Teacher".to_string()),
            ..Default::default()
        });

        assert_eq!(user.full_name, "Renamed Teacher");
        assert_eq!(user.email, "t@x.com");
        assert_eq!(user.role.as_str(), "TEACHER");
    }

    #[test]
    fn profile_round_trips_as_camel_case_json() {
        let user = profile();
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["fullName"], "Test Teacher");
        assert_eq!(json["forcePasswordChange"], false);

        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn missing_optional_fields_default() {
        let back: UserProfile =
            serde_json::from_str(r#"{"id": 3, "email": "s@x.com"}"#).unwrap();
        assert_eq!(back.role.as_str(), "STUDENT");
        assert!(back.permissions.is_empty());
        assert!(!back.force_password_change);
    }
}
