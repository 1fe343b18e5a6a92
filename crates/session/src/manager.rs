//! The session state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use madrasti_core::{AuthError, AuthResult, UserPatch, UserProfile};
use madrasti_store::{SessionStore, StorageBackend};
use madrasti_token as token;

use crate::config::SessionConfig;
use crate::gateway::{AuthGateway, GatewayError, LoginRequest, PasswordChange};
use crate::state::{SessionSnapshot, SessionState, SessionStatus};

/// Persisted key for the user profile mirror.
const KEY_USER: &str = "user";
/// Persisted key for the access token.
const KEY_TOKEN: &str = "token";
/// Persisted key for the refresh token.
const KEY_REFRESH: &str = "refreshToken";

/// Successful login, as reported to the caller.
///
/// `force_password_change` is surfaced so the UI can branch into a
/// mandatory password-change flow instead of the normal destination.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSuccess {
    pub user: UserProfile,
    pub force_password_change: bool,
}

/// Owns the in-memory session and orchestrates every transition against the
/// token codec, the persistent store, and the auth gateway.
///
/// Cloning is cheap and shares the same session; one instance belongs to
/// the composition root and is handed to guards and UI callers.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn AuthGateway>,
    store: SessionStore<Arc<dyn StorageBackend>>,
    config: SessionConfig,
    state: RwLock<SessionState>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    /// Serializes refresh attempts (initialize recovery included) so two
    /// callers cannot both spend a refresh token.
    refresh_lock: tokio::sync::Mutex<()>,
    initialized: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.heartbeat.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn AuthGateway>, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_config(gateway, backend, SessionConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn AuthGateway>,
        backend: Arc<dyn StorageBackend>,
        config: SessionConfig,
    ) -> Self {
        let store = SessionStore::with_prefix(backend, config.storage_prefix.clone());
        Self {
            inner: Arc::new(Inner {
                gateway,
                store,
                config,
                state: RwLock::new(SessionState::initializing()),
                heartbeat: Mutex::new(None),
                refresh_lock: tokio::sync::Mutex::new(()),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    /// Current session as consumers see it.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    fn access_token(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    /// Restore and reconcile the persisted session. Runs at most once per
    /// manager; later calls are no-ops.
    ///
    /// Guards must treat the session as loading until this completes; the
    /// status leaves `Initializing` exactly when this resolves.
    pub async fn initialize(&self) {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(access) = self.inner.store.get::<String>(KEY_TOKEN) else {
            debug!("no persisted access token, starting unauthenticated");
            self.mutate(|s| s.status = SessionStatus::Unauthenticated);
            return;
        };

        if token::is_expired(&access) {
            debug!("persisted access token expired, attempting refresh recovery");
            self.recover_via_refresh().await;
            return;
        }

        // The token is the source of truth for identity, not the persisted
        // user copy.
        let Some(user) = token::extract_user(&access) else {
            warn!("persisted access token carries no user, attempting refresh recovery");
            self.recover_via_refresh().await;
            return;
        };

        match self.inner.gateway.verify_token(&access).await {
            Ok(()) => {
                info!(user_id = %user.id, "session restored");
                let refresh = self.inner.store.get::<String>(KEY_REFRESH);
                self.mutate(|s| {
                    s.status = SessionStatus::Authenticated;
                    s.user = Some(user);
                    s.access_token = Some(access);
                    s.refresh_token = refresh;
                    s.error = None;
                });
                self.start_heartbeat();
            }
            Err(e) => {
                debug!(error = %e, "token verification failed, attempting refresh recovery");
                self.recover_via_refresh().await;
            }
        }
    }

    /// Refresh-token recovery used during initialize.
    async fn recover_via_refresh(&self) {
        let _guard = self.inner.refresh_lock.lock().await;

        let Some(refresh) = self.inner.store.get::<String>(KEY_REFRESH) else {
            debug!("no refresh token, session unrecoverable");
            self.clear_session(None);
            return;
        };

        match self.inner.gateway.refresh(&refresh).await {
            Ok(response) => {
                self.persist_tokens(&response.access, response.refresh.as_deref());

                // Prefer the user copy persisted alongside the old tokens;
                // fall back to the identity inside the fresh token.
                let user = self
                    .inner
                    .store
                    .get::<UserProfile>(KEY_USER)
                    .or_else(|| token::extract_user(&response.access));
                let Some(user) = user else {
                    warn!("refreshed session has no recoverable user");
                    self.clear_session(Some(AuthError::UserExtractionFailed));
                    return;
                };

                info!(user_id = %user.id, "session recovered via refresh");
                let refresh_now = self.inner.store.get::<String>(KEY_REFRESH);
                self.mutate(|s| {
                    s.status = SessionStatus::Authenticated;
                    s.user = Some(user);
                    s.access_token = Some(response.access.clone());
                    s.refresh_token = refresh_now;
                    s.error = None;
                });
                self.start_heartbeat();
            }
            Err(e) => {
                info!(error = %e, "refresh recovery failed, clearing session");
                self.clear_session(None);
            }
        }
    }

    /// Authenticate against the gateway and arm the heartbeat.
    ///
    /// Never panics: every gateway, validation, and extraction failure
    /// comes back as a classified [`AuthError`].
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginSuccess> {
        let response = match self.inner.gateway.login(request).await {
            Ok(response) => response,
            Err(e) => {
                let err = classify_login(e);
                warn!(error = %err, "login failed");
                self.settle_error(err.clone());
                return Err(err);
            }
        };

        let (Some(access), Some(refresh)) = (response.access, response.refresh) else {
            let err = AuthError::InvalidResponse;
            warn!("login response missing tokens");
            self.settle_error(err.clone());
            return Err(err);
        };

        // The response payload wins over token extraction when both exist.
        let user = response.user.or_else(|| token::extract_user(&access));
        let Some(mut user) = user else {
            let err = AuthError::UserExtractionFailed;
            warn!("login response has no user and token extraction failed");
            self.settle_error(err.clone());
            return Err(err);
        };
        user.force_password_change = response.force_password_change.unwrap_or(false);

        self.persist_user(&user);
        self.persist_tokens(&access, Some(&refresh));

        info!(user_id = %user.id, role = user.role.as_str(), "login succeeded");
        self.mutate(|s| {
            s.status = SessionStatus::Authenticated;
            s.user = Some(user.clone());
            s.access_token = Some(access);
            s.refresh_token = Some(refresh);
            s.error = None;
        });
        self.start_heartbeat();

        let force_password_change = user.force_password_change;
        Ok(LoginSuccess {
            user,
            force_password_change,
        })
    }

    /// End the session. Local logout is unconditional: the heartbeat stops
    /// and storage is cleared even when the remote call fails.
    pub async fn logout(&self) {
        self.stop_heartbeat();

        let was_authenticated = self.snapshot().is_authenticated();
        if was_authenticated {
            if let Err(e) = self.inner.gateway.logout().await {
                warn!(error = %e, "remote logout failed, clearing local session anyway");
            }
        }

        self.clear_session(None);
        info!("logged out");
    }

    /// Exchange the persisted refresh token for a new access token.
    ///
    /// Single-flight: concurrent callers serialize, and a caller that finds
    /// the tokens freshly rotated while it waited reuses them instead of
    /// spending the rotated refresh token again. Failure always forces a
    /// logout: an unusable refresh token means the session is over.
    pub async fn refresh(&self) -> AuthResult<String> {
        let before = self.access_token();
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(current) = self.inner.store.get::<String>(KEY_TOKEN) {
            if before.as_ref() != Some(&current) && !token::is_expired(&current) {
                debug!("tokens already rotated by a concurrent refresh");
                return Ok(current);
            }
        }

        let Some(refresh) = self.inner.store.get::<String>(KEY_REFRESH) else {
            return Err(AuthError::NoRefreshToken);
        };

        match self.inner.gateway.refresh(&refresh).await {
            Ok(response) => {
                self.persist_tokens(&response.access, response.refresh.as_deref());
                let refresh_now = self.inner.store.get::<String>(KEY_REFRESH);
                self.mutate(|s| {
                    s.access_token = Some(response.access.clone());
                    s.refresh_token = refresh_now;
                });
                debug!("access token refreshed");
                Ok(response.access)
            }
            Err(e) => {
                let err = classify(e);
                warn!(error = %err, "token refresh failed, forcing logout");
                drop(_guard);
                self.logout().await;
                Err(err)
            }
        }
    }

    /// Change the password through the gateway.
    ///
    /// On success the `force_password_change` flag is cleared in memory and
    /// in storage so a reload does not re-trigger the mandatory flow.
    /// Tokens are untouched. The server's message comes back verbatim.
    pub async fn change_password(&self, change: PasswordChange) -> AuthResult<String> {
        match self.inner.gateway.change_password(change.into()).await {
            Ok(response) => {
                self.mutate(|s| {
                    if let Some(user) = s.user.as_mut() {
                        user.force_password_change = false;
                    }
                });
                if let Some(user) = self.snapshot().user {
                    self.persist_user(&user);
                }
                info!("password changed");
                Ok(response.message)
            }
            Err(e) => {
                let err = classify(e);
                warn!(error = %err, "password change failed");
                Err(err)
            }
        }
    }

    /// Shallow-merge a profile edit into the current user and persist the
    /// result. Tokens and status are untouched; a no-op when signed out.
    pub fn update_user(&self, patch: UserPatch) {
        self.mutate(|s| {
            if let Some(user) = s.user.as_mut() {
                user.apply(patch);
            }
        });
        if let Some(user) = self.snapshot().user {
            self.persist_user(&user);
        }
    }

    /// Arm the presence heartbeat: one signal immediately, then one per
    /// configured interval. Idempotent: any previously armed task is
    /// cancelled first, so repeated calls leave exactly one timer.
    pub fn start_heartbeat(&self) {
        let Ok(mut slot) = self.inner.heartbeat.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let gateway = Arc::clone(&self.inner.gateway);
        let period = self.inner.config.heartbeat_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                // Advisory presence only: failure never touches the session.
                if let Err(e) = gateway.heartbeat().await {
                    debug!(error = %e, "heartbeat failed");
                }
            }
        }));
    }

    /// Disarm the heartbeat. In-flight signals are not awaited.
    pub fn stop_heartbeat(&self) {
        let Ok(mut slot) = self.inner.heartbeat.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    fn persist_user(&self, user: &UserProfile) {
        if let Err(e) = self.inner.store.set(KEY_USER, user) {
            warn!(error = %e, "failed to persist user");
        }
    }

    fn persist_tokens(&self, access: &str, refresh: Option<&str>) {
        if let Err(e) = self.inner.store.set(KEY_TOKEN, &access) {
            warn!(error = %e, "failed to persist access token");
        }
        // No rotated refresh token in the response means the old one is
        // still the one to keep.
        if let Some(refresh) = refresh {
            if let Err(e) = self.inner.store.set(KEY_REFRESH, &refresh) {
                warn!(error = %e, "failed to persist refresh token");
            }
        }
    }

    fn clear_keys(&self) {
        for key in [KEY_USER, KEY_TOKEN, KEY_REFRESH] {
            if let Err(e) = self.inner.store.remove(key) {
                warn!(key, error = %e, "failed to remove persisted key");
            }
        }
    }

    /// Drop to `Unauthenticated` with storage cleared. Any armed heartbeat
    /// is disarmed, since it only ever runs for an authenticated session.
    fn clear_session(&self, error: Option<AuthError>) {
        self.stop_heartbeat();
        self.clear_keys();
        self.mutate(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.user = None;
            s.access_token = None;
            s.refresh_token = None;
            s.error = error;
        });
    }

    /// Error settling: pass through `Error`, clear storage, come to rest at
    /// `Unauthenticated` with the error payload retained for display.
    fn settle_error(&self, err: AuthError) {
        self.stop_heartbeat();
        self.mutate(|s| {
            s.status = SessionStatus::Error;
            s.error = Some(err.clone());
        });
        self.clear_keys();
        self.mutate(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.user = None;
            s.access_token = None;
            s.refresh_token = None;
        });
    }
}

/// Map a gateway failure to the caller-facing taxonomy.
fn classify(err: GatewayError) -> AuthError {
    match err {
        GatewayError::Unauthorized => AuthError::rejected("unauthorized"),
        GatewayError::Rejected(msg) => AuthError::Rejected(msg),
        GatewayError::Transport(e) => AuthError::network(e.to_string()),
    }
}

/// Login-specific classification: a 401 means bad credentials, which gets
/// its own user-facing message.
fn classify_login(err: GatewayError) -> AuthError {
    match err {
        GatewayError::Unauthorized => AuthError::InvalidCredentials,
        other => classify(other),
    }
}
