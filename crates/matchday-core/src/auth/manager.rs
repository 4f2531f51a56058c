//! Session lifecycle: the single source of truth for "is the user
//! authenticated, and with what credentials".
//!
//! The manager owns the access/refresh token pair, tracks expiry, verifies
//! the session on startup, and serializes every mutating operation through
//! one async mutex so there is never more than one authoritative session
//! mutation in flight. Concurrent callers queue rather than fail. Read
//! queries go through a separate snapshot lock that is write-held only for
//! brief installs, never across a network await, so status polls stay
//! responsive during a slow login.

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::api::{ApiClient, AuthSuccess, LoginRequest, RegisterRequest};
use crate::config::{Config, StoreBackend};
use crate::models::UserProfile;

use super::session::PersistedSession;
use super::store::{FileSessionStore, KeychainSessionStore, SessionStore, KEYCHAIN_SERVICE};
use super::AuthError;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication state. `Unknown` only exists before the first `resume`;
/// `LoggedOut` and `LoggedIn` are both re-enterable indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unknown,
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Default)]
struct Inner {
    state: AuthState,
    session: Option<PersistedSession>,
}

/// Owns the session for the whole application. Construct one per process and
/// inject it into the UI layer; there is no module-level singleton.
pub struct SessionManager {
    client: ApiClient,
    store: Box<dyn SessionStore>,
    /// Serializes the mutating operations; held across their network awaits.
    op_lock: Mutex<()>,
    /// Snapshot for read queries; write-locked only for short installs.
    inner: RwLock<Inner>,
}

impl SessionManager {
    pub fn new(client: ApiClient, store: Box<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            op_lock: Mutex::new(()),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Build a manager from application config, choosing the configured
    /// store backend.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ApiClient::new(config.api_base_url.clone())?;
        let store: Box<dyn SessionStore> = match config.store_backend {
            StoreBackend::File => Box::new(FileSessionStore::new(config.cache_dir()?)),
            StoreBackend::Keychain => Box::new(KeychainSessionStore::new(
                KEYCHAIN_SERVICE,
                config.last_email.as_deref().unwrap_or("default"),
            )),
        };
        Ok(Self::new(client, store))
    }

    // ===== Queries =====

    pub async fn state(&self) -> AuthState {
        self.inner.read().await.state
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.state == AuthState::LoggedIn
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.inner.read().await.session.as_ref().map(|s| s.user.clone())
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn session_duration(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .session
            .as_ref()
            .and_then(|s| s.session_duration.clone())
    }

    /// API client carrying the current access token, for resource requests.
    pub async fn api(&self) -> ApiClient {
        match self.access_token().await {
            Some(token) => self.client.with_token(token),
            None => self.client.clone(),
        }
    }

    // ===== Resume =====

    /// Restore a previously persisted session at startup.
    ///
    /// Always terminates in a well-defined state: `LoggedIn` with a user
    /// profile or `LoggedOut` with the store empty. Failures are logged,
    /// never surfaced - the app simply opens to the login screen.
    pub async fn resume(&self) -> AuthState {
        let _op = self.op_lock.lock().await;

        let mut session = match self.store.load() {
            Ok(Some(session)) => session,
            Ok(None) => return self.settle_logged_out().await,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session");
                return self.settle_logged_out().await;
            }
        };

        if session.is_expired() {
            debug!("Stored access token expired, refreshing");
            if let Err(e) = self.refresh_session(&mut session).await {
                debug!(error = %e, "Refresh during resume failed");
                return self.settle_logged_out().await;
            }
        }

        match self.client.verify(&session.access_token).await {
            Ok(user) => {
                // Server profile is authoritative
                session.user = user;
                if let Err(e) = self.store.save(&session) {
                    warn!(error = %e, "Failed to persist verified session");
                }
                self.install(session).await
            }
            Err(e) if e.is_connectivity() => {
                // Server unreachable: trust the cached profile so the app
                // stays usable offline. The session is re-checked on the
                // next successful network call.
                warn!(error = %e, "Verify unreachable, using cached profile");
                self.install(session).await
            }
            Err(e) => {
                debug!(error = %e, "Session verification rejected");
                self.settle_logged_out().await
            }
        }
    }

    // ===== Login / Register =====

    /// Authenticate with email and password. No local format validation -
    /// the backend owns credential checking. Persists the full session
    /// atomically on success and changes nothing on failure.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<UserProfile, AuthError> {
        let _op = self.op_lock.lock().await;
        let response = self
            .client
            .login(&LoginRequest {
                email,
                password,
                remember_me,
            })
            .await?;
        self.install_session(response, remember_me).await
    }

    /// Create an account. Client-side pre-validation runs before any network
    /// call; otherwise the contract matches `login`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
        remember_me: bool,
    ) -> Result<UserProfile, AuthError> {
        validate_registration(name, email, password, confirm_password)?;

        let _op = self.op_lock.lock().await;
        let response = self
            .client
            .register(&RegisterRequest {
                name,
                email,
                password,
                confirm_password,
                remember_me,
            })
            .await?;
        self.install_session(response, remember_me).await
    }

    async fn install_session(
        &self,
        response: AuthSuccess,
        remember_me: bool,
    ) -> Result<UserProfile, AuthError> {
        let user = response.user.clone();
        let session = PersistedSession::from_grant(
            response.user,
            &response.tokens,
            remember_me,
            response.session_info.and_then(|info| info.duration),
        );
        self.store.save(&session)?;
        debug!(user = %session.user.id, "Session established");
        self.install(session).await;
        Ok(user)
    }

    // ===== Refresh =====

    /// Exchange the stored refresh token for a rotated pair.
    ///
    /// Fails immediately with `NoSession` when no refresh token is stored.
    /// On success the complete new tuple is persisted and the old refresh
    /// token is gone. Auth state is untouched: a logged-in session stays
    /// logged in, and a refresh before `resume` rotates the persisted tuple
    /// without deciding the state. A failure changes nothing and is never
    /// auto-retried; the caller decides whether to log out.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _op = self.op_lock.lock().await;

        let (mut session, tracked) = match self.inner.read().await.session.clone() {
            Some(session) => (session, true),
            None => (self.store.load()?.ok_or(AuthError::NoSession)?, false),
        };
        if session.refresh_token.is_empty() {
            return Err(AuthError::NoSession);
        }

        self.refresh_session(&mut session).await?;
        if tracked {
            self.inner.write().await.session = Some(session);
        }
        Ok(())
    }

    /// Rotate tokens and persist the replacement tuple in one batched write.
    async fn refresh_session(&self, session: &mut PersistedSession) -> Result<(), AuthError> {
        let response = self.client.refresh(&session.refresh_token).await?;
        session.rotate(&response.tokens, response.remember_me);
        self.store.save(session)?;
        debug!("Refresh token rotated");
        Ok(())
    }

    // ===== Logout =====

    /// End the session. The server call is best-effort: its failure is
    /// logged and swallowed, and the local store is cleared unconditionally.
    /// After this returns the device holds no credentials. Idempotent.
    pub async fn logout(&self) {
        let _op = self.op_lock.lock().await;

        let session = match self.inner.read().await.session.clone() {
            Some(session) => Some(session),
            None => self.store.load().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load session during logout");
                None
            }),
        };

        if let Some(session) = session {
            if let Err(e) = self
                .client
                .logout(&session.access_token, &session.refresh_token)
                .await
            {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }

        self.settle_logged_out().await;
    }

    // ===== Snapshot updates (callers hold `op_lock`) =====

    /// Publish a logged-in session to the read snapshot.
    async fn install(&self, session: PersistedSession) -> AuthState {
        let mut inner = self.inner.write().await;
        inner.session = Some(session);
        inner.state = AuthState::LoggedIn;
        AuthState::LoggedIn
    }

    /// Clear the store and the read snapshot.
    async fn settle_logged_out(&self) -> AuthState {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session store");
        }
        let mut inner = self.inner.write().await;
        inner.session = None;
        inner.state = AuthState::LoggedOut;
        AuthState::LoggedOut
    }
}

fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AuthError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "All fields are required".to_string(),
        ));
    }
    if password != confirm_password {
        return Err(AuthError::Validation("Passwords do not match".to_string()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
