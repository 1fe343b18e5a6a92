//! `madrasti-session` — the session state machine and its gateway boundary.
//!
//! [`SessionManager`] owns the in-memory session: it restores persisted
//! credentials on startup, reconciles them with the auth service, runs the
//! presence heartbeat while authenticated, and is the single error boundary
//! between the auth service and the rest of the application. The auth
//! service itself is reached only through the injected [`AuthGateway`]
//! trait, so tests and non-browser hosts substitute their own transport.

pub mod config;
pub mod gateway;
pub mod manager;
pub mod state;

pub use config::SessionConfig;
pub use gateway::{
    AuthGateway, ChangePasswordRequest, ChangePasswordResponse, GatewayError, LoginRequest,
    LoginResponse, PasswordChange, RefreshResponse,
};
pub use manager::{LoginSuccess, SessionManager};
pub use state::{SessionSnapshot, SessionStatus};
