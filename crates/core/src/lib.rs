//! `madrasti-core` — domain foundation for the session subsystem.
//!
//! This crate contains **pure domain** primitives (no I/O, no async).

pub mod error;
pub mod permission;
pub mod role;
pub mod user;

pub use error::{AuthError, AuthResult};
pub use permission::Permission;
pub use role::Role;
pub use user::{UserId, UserPatch, UserProfile};
