//! `madrasti-access` — pure authorization checks and render guards.
//!
//! This crate is intentionally decoupled from transport and storage: it
//! consumes session snapshots and answers "may this user see this" as plain
//! data the host UI acts on.

pub mod evaluator;
pub mod guard;

pub use evaluator::{
    AccessRequirements, check_access, has_any_permission, has_any_role, has_permission, has_role,
};
pub use guard::{DenialBehavior, GuardOutcome, component_visible, guard_route, role_home};
