use serde::Deserialize;

use madrasti_core::{Permission, Role, UserId, UserProfile};

/// Claims carried in the payload segment of an access token.
///
/// Every field is optional: the codec never rejects a token for missing
/// claims, it only reports what is absent. Unknown claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,

    /// Expiry, seconds since epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at, seconds since epoch.
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    /// Map claims into the session's user shape.
    ///
    /// Returns `None` when the token carries no `user_id`; a profile
    /// without an identity is unusable downstream. Role defaults to
    /// `STUDENT` and permissions to empty, matching the identity service's
    /// own defaults.
    pub fn into_user(self) -> Option<UserProfile> {
        let id = UserId::new(self.user_id?);
        Some(UserProfile {
            id,
            email: self.email.unwrap_or_default(),
            full_name: self.full_name.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            role: self.role.map(Role::new).unwrap_or_default(),
            permissions: self
                .permissions
                .unwrap_or_default()
                .into_iter()
                .map(Permission::new)
                .collect(),
            force_password_change: false,
        })
    }
}
