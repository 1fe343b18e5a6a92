//! Route and component guards.
//!
//! Guards consume the session snapshot plus access requirements and answer
//! with a [`GuardOutcome`]; the host UI owns the actual navigation and
//! rendering. They perform no error handling of their own; the session
//! manager already settled everything into `{status, user}`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use madrasti_core::Role;
use madrasti_session::{SessionSnapshot, SessionStatus};

use crate::evaluator::{AccessRequirements, check_access};

/// What a route guard tells the host to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Session still initializing; show a loading indicator, decide nothing.
    Loading,
    /// Not signed in; go to login and come back here afterwards.
    RedirectToLogin { return_to: String },
    /// Signed in but not allowed; send the user to their own home.
    RedirectHome { to: String },
    /// Signed in but not allowed; show the access-denied view in place.
    Denied,
    /// Render the protected content.
    Render,
}

/// How a failed role/permission check is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenialBehavior {
    /// Redirect to the user's role-appropriate home.
    #[default]
    RedirectHome,
    /// Render a fixed access-denied view.
    ShowDenied,
}

/// Home path for a role, used when bouncing a user off a page they may not
/// see.
pub fn role_home(role: &Role) -> &'static str {
    match role.as_str() {
        "ADMIN" => "/admin",
        "TEACHER" => "/teacher",
        "STUDENT" => "/student",
        "PARENT" => "/parent",
        _ => "/",
    }
}

/// Decide what to do with a request for a protected route.
///
/// `requested_path` is preserved in the login redirect so the user lands
/// back where they were headed.
pub fn guard_route(
    snapshot: &SessionSnapshot,
    requirements: &AccessRequirements,
    requested_path: &str,
    denial: DenialBehavior,
) -> GuardOutcome {
    if snapshot.status == SessionStatus::Initializing {
        return GuardOutcome::Loading;
    }

    let Some(user) = snapshot.user.as_ref().filter(|_| snapshot.is_authenticated()) else {
        return GuardOutcome::RedirectToLogin {
            return_to: requested_path.to_string(),
        };
    };

    if check_access(user, requirements) {
        GuardOutcome::Render
    } else {
        debug!(
            user_id = %user.id,
            role = user.role.as_str(),
            path = requested_path,
            "access denied"
        );
        match denial {
            DenialBehavior::RedirectHome => GuardOutcome::RedirectHome {
                to: role_home(&user.role).to_string(),
            },
            DenialBehavior::ShowDenied => GuardOutcome::Denied,
        }
    }
}

/// Inline variant: show or hide a subtree, no redirects.
///
/// Loading and signed-out sessions hide the subtree.
pub fn component_visible(snapshot: &SessionSnapshot, requirements: &AccessRequirements) -> bool {
    snapshot
        .user
        .as_ref()
        .filter(|_| snapshot.is_authenticated())
        .is_some_and(|user| check_access(user, requirements))
}

#[cfg(test)]
mod tests {
    use super::*;

    use madrasti_core::{AuthError, UserProfile};

    fn snapshot(status: SessionStatus, user: Option<UserProfile>) -> SessionSnapshot {
        SessionSnapshot {
            status,
            user,
            error: None,
        }
    }

    fn teacher() -> UserProfile {
        UserProfile {
            id: 42.into(),
            email: "t@x.com".to_string(),
            full_name: "Test Teacher".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::new("TEACHER"),
            permissions: vec![],
            force_password_change: false,
        }
    }

    #[test]
    fn initializing_session_waits() {
        let outcome = guard_route(
            &snapshot(SessionStatus::Initializing, None),
            &AccessRequirements::none(),
            "/teacher/assignments",
            DenialBehavior::default(),
        );
        assert_eq!(outcome, GuardOutcome::Loading);
    }

    #[test]
    fn signed_out_session_redirects_to_login_with_return_path() {
        let outcome = guard_route(
            &snapshot(SessionStatus::Unauthenticated, None),
            &AccessRequirements::none(),
            "/teacher/assignments",
            DenialBehavior::default(),
        );
        assert_eq!(
            outcome,
            GuardOutcome::RedirectToLogin {
                return_to: "/teacher/assignments".to_string()
            }
        );
    }

    #[test]
    fn settled_error_state_also_redirects_to_login() {
        let mut snap = snapshot(SessionStatus::Unauthenticated, None);
        snap.error = Some(AuthError::InvalidCredentials);

        let outcome = guard_route(
            &snap,
            &AccessRequirements::none(),
            "/student",
            DenialBehavior::default(),
        );
        assert!(matches!(outcome, GuardOutcome::RedirectToLogin { .. }));
    }

    #[test]
    fn allowed_user_renders() {
        let outcome = guard_route(
            &snapshot(SessionStatus::Authenticated, Some(teacher())),
            &AccessRequirements::roles([Role::new("ADMIN"), Role::new("TEACHER")]),
            "/teacher/assignments",
            DenialBehavior::default(),
        );
        assert_eq!(outcome, GuardOutcome::Render);
    }

    #[test]
    fn disallowed_user_bounces_to_role_home() {
        let outcome = guard_route(
            &snapshot(SessionStatus::Authenticated, Some(teacher())),
            &AccessRequirements::roles([Role::new("ADMIN")]),
            "/admin/users",
            DenialBehavior::RedirectHome,
        );
        assert_eq!(
            outcome,
            GuardOutcome::RedirectHome {
                to: "/teacher".to_string()
            }
        );
    }

    #[test]
    fn disallowed_user_can_see_denied_view_instead() {
        let outcome = guard_route(
            &snapshot(SessionStatus::Authenticated, Some(teacher())),
            &AccessRequirements::roles([Role::new("ADMIN")]),
            "/admin/users",
            DenialBehavior::ShowDenied,
        );
        assert_eq!(outcome, GuardOutcome::Denied);
    }

    #[test]
    fn role_home_covers_known_roles() {
        assert_eq!(role_home(&Role::new("ADMIN")), "/admin");
        assert_eq!(role_home(&Role::new("TEACHER")), "/teacher");
        assert_eq!(role_home(&Role::new("STUDENT")), "/student");
        assert_eq!(role_home(&Role::new("PARENT")), "/parent");
        assert_eq!(role_home(&Role::new("LIBRARIAN")), "/");
    }

    #[test]
    fn component_visibility_follows_the_access_check() {
        let allowed = AccessRequirements::roles([Role::new("TEACHER")]);
        let admin_only = AccessRequirements::roles([Role::new("ADMIN")]);

        let signed_in = snapshot(SessionStatus::Authenticated, Some(teacher()));
        assert!(component_visible(&signed_in, &allowed));
        assert!(!component_visible(&signed_in, &admin_only));

        let loading = snapshot(SessionStatus::Initializing, None);
        assert!(!component_visible(&loading, &allowed));

        let signed_out = snapshot(SessionStatus::Unauthenticated, None);
        assert!(!component_visible(&signed_out, &allowed));
    }
}
