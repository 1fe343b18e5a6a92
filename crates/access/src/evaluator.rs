//! Role/permission predicates over the current user.
//!
//! - No IO
//! - No panics
//! - No session mutation (pure policy check)

use serde::{Deserialize, Serialize};

use madrasti_core::{Permission, Role, UserProfile};

pub fn has_role(user: &UserProfile, role: &Role) -> bool {
    user.role == *role
}

pub fn has_any_role(user: &UserProfile, roles: &[Role]) -> bool {
    roles.iter().any(|role| has_role(user, role))
}

pub fn has_permission(user: &UserProfile, permission: &Permission) -> bool {
    user.permissions.contains(permission)
}

pub fn has_any_permission(user: &UserProfile, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| has_permission(user, p))
}

/// What a guard demands of the current user.
///
/// Empty requirement lists are vacuously satisfied; they never block
/// access. `require_all` switches both axes between ALL and ANY semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequirements {
    #[serde(default)]
    pub allowed_roles: Vec<Role>,
    #[serde(default)]
    pub required_permissions: Vec<Permission>,
    #[serde(default)]
    pub require_all: bool,
}

impl AccessRequirements {
    /// Requirements that admit everyone (both lists empty).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed_roles: roles.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.required_permissions = permissions.into_iter().collect();
        self
    }

    pub fn with_require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }
}

/// Composite check used by guards: role access AND permission access.
pub fn check_access(user: &UserProfile, requirements: &AccessRequirements) -> bool {
    let role_ok = if requirements.allowed_roles.is_empty() {
        true
    } else if requirements.require_all {
        requirements
            .allowed_roles
            .iter()
            .all(|role| has_role(user, role))
    } else {
        has_any_role(user, &requirements.allowed_roles)
    };

    let permission_ok = if requirements.required_permissions.is_empty() {
        true
    } else if requirements.require_all {
        requirements
            .required_permissions
            .iter()
            .all(|p| has_permission(user, p))
    } else {
        has_any_permission(user, &requirements.required_permissions)
    };

    role_ok && permission_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &'static str, permissions: &[&'static str]) -> UserProfile {
        UserProfile {
            id: 1.into(),
            email: "u@x.com".to_string(),
            full_name: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::new(role),
            permissions: permissions.iter().map(|p| Permission::new(*p)).collect(),
            force_password_change: false,
        }
    }

    // Role axis, ANY semantics.
    #[test]
    fn any_of_allowed_roles_passes() {
        let requirements =
            AccessRequirements::roles([Role::new("ADMIN"), Role::new("TEACHER")]);

        assert!(check_access(&user("TEACHER", &[]), &requirements));
        assert!(!check_access(&user("STUDENT", &[]), &requirements));
    }

    // Permission axis, ALL semantics.
    #[test]
    fn require_all_demands_every_permission() {
        let requirements = AccessRequirements::none()
            .with_permissions([Permission::new("a"), Permission::new("b")])
            .with_require_all(true);

        assert!(!check_access(&user("STUDENT", &["a"]), &requirements));
        assert!(check_access(&user("STUDENT", &["a", "b"]), &requirements));
    }

    #[test]
    fn empty_requirements_admit_everyone() {
        assert!(check_access(&user("STUDENT", &[]), &AccessRequirements::none()));
    }

    #[test]
    fn both_axes_must_pass() {
        let requirements = AccessRequirements::roles([Role::new("TEACHER")])
            .with_permissions([Permission::new("assignments.grade")]);

        assert!(check_access(
            &user("TEACHER", &["assignments.grade"]),
            &requirements
        ));
        // Right role, missing permission.
        assert!(!check_access(&user("TEACHER", &[]), &requirements));
        // Right permission, wrong role.
        assert!(!check_access(
            &user("STUDENT", &["assignments.grade"]),
            &requirements
        ));
    }

    #[test]
    fn predicates_match_exactly() {
        let u = user("PARENT", &["children.view"]);
        assert!(has_role(&u, &Role::new("PARENT")));
        assert!(!has_role(&u, &Role::new("ADMIN")));
        assert!(has_permission(&u, &Permission::new("children.view")));
        assert!(!has_permission(&u, &Permission::new("children.edit")));
        assert!(has_any_role(&u, &[Role::new("ADMIN"), Role::new("PARENT")]));
        assert!(!has_any_permission(&u, &[Permission::new("x")]));
    }
}
