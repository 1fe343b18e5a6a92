//! Session error model.

use thiserror::Error;

/// Result type used across the session subsystem.
pub type AuthResult<T> = Result<T, AuthError>;

/// Classified authentication failure.
///
/// Every variant carries a stable message key so the host UI can localize
/// without parsing error strings. The session state machine is the error
/// boundary: gateway and storage failures are classified here and never
/// propagate raw.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The server rejected the credentials (HTTP 401 on login).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A login response was missing the access or refresh token.
    #[error("invalid login response")]
    InvalidResponse,

    /// No user object in the response and none extractable from the token.
    #[error("could not extract user from token")]
    UserExtractionFailed,

    /// A refresh was requested but no refresh token is persisted.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The server answered with a domain rejection and a message.
    #[error("{0}")]
    Rejected(String),

    /// Transport-level failure (connection, timeout, malformed response).
    #[error("network error: {0}")]
    Network(String),
}

impl AuthError {
    /// Stable key for user-facing message lookup.
    pub fn message_key(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "auth.invalidCredentials",
            AuthError::InvalidResponse => "auth.invalidResponse",
            AuthError::UserExtractionFailed => "auth.userExtractionFailed",
            AuthError::NoRefreshToken => "auth.noRefreshToken",
            AuthError::Rejected(_) => "auth.rejected",
            AuthError::Network(_) => "auth.networkError",
        }
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}
