//! Auth service boundary: wire contract and transport-agnostic trait.
//!
//! The session core consumes this contract but does not own the transport.
//! A browser host implements [`AuthGateway`] over its HTTP client; tests
//! implement it in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use madrasti_core::UserProfile;

/// Failure of a gateway call.
///
/// The state machine treats all of these uniformly except `Unauthorized`,
/// which is classified to a distinct "invalid credentials" error during
/// login.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server rejected the request as unauthenticated (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The server answered with a domain rejection and a message.
    #[error("{0}")]
    Rejected(String),

    /// The call never produced a usable response (connection, timeout,
    /// malformed body).
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// `POST login` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST login` response body.
///
/// Both tokens are optional at the wire level; the state machine enforces
/// their presence and classifies absence as an invalid response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub force_password_change: Option<bool>,
    /// Some deployments inline the user; when present it wins over token
    /// extraction.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// `POST refresh` response body. A missing `refresh` means the server did
/// not rotate the refresh token and the old one stays valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Password change as the caller states it.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

/// `POST change-password` request body (wire field names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl From<PasswordChange> for ChangePasswordRequest {
    fn from(change: PasswordChange) -> Self {
        Self {
            current_password: change.current,
            new_password: change.new,
            confirm_password: change.confirm,
        }
    }
}

/// `POST change-password` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    pub message: String,
}

/// Remote auth service operations, as consumed by the session core.
///
/// Every call is fallible and may suspend indefinitely; timeout policy
/// belongs to the implementation, not to the state machine.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, GatewayError>;

    /// Check that an access token is still accepted by the server.
    async fn verify_token(&self, token: &str) -> Result<(), GatewayError>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, GatewayError>;

    /// Best-effort server-side session termination.
    async fn logout(&self) -> Result<(), GatewayError>;

    /// Best-effort presence signal.
    async fn heartbeat(&self) -> Result<(), GatewayError>;

    async fn change_password(
        &self,
        request: ChangePasswordRequest,
    ) -> Result<ChangePasswordResponse, GatewayError>;
}
