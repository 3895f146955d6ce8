//! Authentication session manager.
//!
//! [`SessionManager`] sits between user actions (login, register, logout,
//! profile edits, password reset) and the [`ApiClient`], and publishes a
//! [`SessionState`] snapshot on a watch channel after every change.
//!
//! # Policy
//!
//! Holding an access token is enough to be authenticated. The profile is
//! fetched best-effort: if that fetch fails the session is
//! [`AuthStatus::AuthenticatedNoProfile`] rather than signed out. Logout
//! always signs out locally, whatever the backend answers.
//!
//! # Loading flag
//!
//! `is_loading` is raised for hydration, login and registration only, and
//! is lowered by a drop guard so it cannot stay raised if the operation
//! future is dropped part-way.

mod error;
mod state;

pub use error::AuthError;
pub use state::{AuthStatus, SessionState};

use std::sync::Arc;

use driphub_core::UserProfile;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    ApiClient, ApiError, ApiEvent, ApiResponse, LoginRequest, ResetPasswordRequest, SignupRequest,
};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::persist;
use crate::storage::{SharedStore, USER_DATA_KEY};

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// The backend issued tokens; the user is signed in.
    SignedIn(Option<UserProfile>),
    /// The account exists but the user must log in explicitly.
    LoginRequired,
}

/// Profile bodies come bare or wrapped under `user` or `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileBody {
    User { user: UserProfile },
    Data { data: UserProfile },
    Bare(UserProfile),
}

impl ProfileBody {
    fn into_profile(self) -> UserProfile {
        match self {
            Self::User { user: profile } | Self::Data { data: profile } | Self::Bare(profile) => {
                profile
            }
        }
    }
}

/// Decode a profile from a success envelope, ignoring bodies with no
/// identifying field at all.
fn profile_from(response: &ApiResponse) -> Option<UserProfile> {
    let profile = response.data_as::<ProfileBody>()?.into_profile();
    (profile.id.is_some() || profile.email.is_some() || profile.name.is_some()).then_some(profile)
}

/// Raises `is_loading` for its lifetime.
///
/// On drop, lowers the flag and, if the operation never settled the status,
/// puts back the status it found.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    previous: AuthStatus,
}

impl<'a> LoadingGuard<'a> {
    fn raise(state: &'a watch::Sender<SessionState>) -> Self {
        let mut previous = AuthStatus::Unauthenticated;
        state.send_modify(|s| {
            if s.status != AuthStatus::Authenticating {
                previous = s.status;
            }
            s.status = AuthStatus::Authenticating;
            s.is_loading = true;
        });
        Self { state, previous }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let previous = self.previous;
        self.state.send_modify(|s| {
            s.is_loading = false;
            if s.status == AuthStatus::Authenticating {
                s.status = previous;
            }
        });
    }
}

/// Owns the client-side session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    store: SharedStore,
    state: watch::Sender<SessionState>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager in the hydrating state. Call [`hydrate`](Self::hydrate)
    /// once at startup.
    #[must_use]
    pub fn new(api: ApiClient, store: SharedStore) -> Self {
        let (state, _) = watch::channel(SessionState::hydrating());
        Self {
            inner: Arc::new(SessionInner { api, store, state }),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.borrow().user.clone()
    }

    /// Whether an access token is stored. Storage-only, never waits.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.api.has_token()
    }

    /// The API client this session authenticates.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore the session from storage at startup.
    ///
    /// With no token the session is signed out. With a token the profile is
    /// fetched: a 401 that survives the refresh attempt signs out and drops
    /// the tokens; any other failure keeps the session, using the cached
    /// profile if one was stored.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> SessionState {
        let loading = LoadingGuard::raise(&self.inner.state);
        self.restore().await;
        drop(loading);
        self.state()
    }

    async fn restore(&self) {
        if !self.inner.api.has_token() {
            debug!("no stored token, session starts signed out");
            self.forget_profile();
            self.inner.state.send_modify(SessionState::sign_out);
            return;
        }

        let response = self.inner.api.profile().await;
        if let Some(profile) = profile_from(&response) {
            self.remember_profile(&profile);
            self.sign_in(Some(profile));
        } else if response.is_unauthorized() {
            info!("stored token rejected, signing out");
            self.inner.api.clear_tokens();
            self.forget_profile();
            self.inner.state.send_modify(SessionState::sign_out);
        } else {
            let cached: Option<UserProfile> =
                persist::load_value(self.inner.store.as_ref(), USER_DATA_KEY);
            warn!(
                status = response.status,
                message = %response.message,
                using_cached_profile = cached.is_some(),
                "profile fetch failed during hydration"
            );
            self.sign_in(cached);
        }
    }

    /// Sign the session out locally without contacting the backend.
    ///
    /// Used when the token refresh fails; route checks then redirect to the
    /// login page because no token is held.
    pub fn expire(&self) {
        info!("session expired");
        self.inner.api.clear_tokens();
        self.forget_profile();
        self.inner.state.send_modify(SessionState::sign_out);
        clear_sentry_user();
    }

    /// Expire the session whenever the API client reports a failed refresh.
    ///
    /// The task ends when the client is dropped.
    #[must_use]
    pub fn watch_expiry(&self) -> JoinHandle<()> {
        let session = self.clone();
        let mut events = self.inner.api.events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ApiEvent::SessionExpired) => session.expire(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "session event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in with `credentials`.
    ///
    /// Returns the profile when it could be fetched. A missing profile does
    /// not fail the login.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the backend rejects the credentials,
    /// `MissingToken` when it answers without a token, or `Api` for other
    /// failures. The session is left as it was, except when the new token is
    /// rejected and cannot be refreshed: then the session is expired.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Option<UserProfile>, AuthError> {
        let _loading = LoadingGuard::raise(&self.inner.state);

        let response = self.inner.api.login(credentials).await;
        if !response.success {
            return Err(AuthError::from_credentials_failure(response.into_error()));
        }
        if !response.has_access_token() {
            return Err(AuthError::MissingToken);
        }

        let user = self.fetch_profile_or(&response).await;
        self.ensure_token_survived()?;
        self.sign_in(user.clone());
        info!(has_profile = user.is_some(), "logged in");
        Ok(user)
    }

    /// Register a new account.
    ///
    /// If the backend returns tokens the user is signed in exactly as for
    /// [`login`](Self::login).
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the backend rejects the data, or
    /// `Api` for other failures.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn register(&self, data: &SignupRequest) -> Result<RegisterOutcome, AuthError> {
        let _loading = LoadingGuard::raise(&self.inner.state);

        let response = self.inner.api.signup(data).await;
        if !response.success {
            return Err(AuthError::from_credentials_failure(response.into_error()));
        }
        if !response.has_access_token() {
            info!("registered, login required");
            return Ok(RegisterOutcome::LoginRequired);
        }

        let user = self.fetch_profile_or(&response).await;
        self.ensure_token_survived()?;
        self.sign_in(user.clone());
        info!(has_profile = user.is_some(), "registered and signed in");
        Ok(RegisterOutcome::SignedIn(user))
    }

    /// Log out. Always signs out locally; a failed backend call is logged.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let response = self.inner.api.logout().await;
        if !response.success {
            warn!(
                status = response.status,
                message = %response.message,
                "remote logout failed, signing out locally"
            );
        }
        self.forget_profile();
        self.inner.state.send_modify(SessionState::sign_out);
        clear_sentry_user();
        info!("logged out");
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Apply `changes` to the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, or `Api` if the backend
    /// rejects the update. State is unchanged on error unless the token was
    /// rejected and could not be refreshed, which expires the session.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        changes: &Map<String, Value>,
    ) -> Result<UserProfile, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }

        let response = self.inner.api.update_profile(changes).await;
        if !response.success {
            self.expire_if_token_lost();
            return Err(AuthError::Api(response.into_error()));
        }

        let profile = profile_from(&response).unwrap_or_else(|| {
            let mut merged = self.user().unwrap_or_default();
            merged.merge(changes);
            merged
        });
        self.remember_profile(&profile);
        self.sign_in(Some(profile.clone()));
        Ok(profile)
    }

    /// Re-fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, or `Api` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<UserProfile, AuthError> {
        if !self.inner.api.has_token() {
            return Err(AuthError::NotAuthenticated);
        }
        let response = self.inner.api.profile().await;
        if !response.success {
            self.expire_if_token_lost();
            return Err(AuthError::Api(response.into_error()));
        }
        let profile = profile_from(&response).ok_or_else(|| {
            AuthError::Api(ApiError::Status {
                status: response.status,
                message: "profile response did not include a user".to_string(),
                body: response.data.clone(),
            })
        })?;
        self.remember_profile(&profile);
        self.sign_in(Some(profile.clone()));
        Ok(profile)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Request a password reset email. Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the backend call fails.
    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        let response = self.inner.api.forgot_password(email).await;
        if response.success {
            Ok(response.message)
        } else {
            Err(AuthError::Api(response.into_error()))
        }
    }

    /// Set a new password with a reset token. Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the backend call fails.
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<String, AuthError> {
        let response = self.inner.api.reset_password(request).await;
        if response.success {
            Ok(response.message)
        } else {
            Err(AuthError::Api(response.into_error()))
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Fetch the profile after a token was issued, falling back to a `user`
    /// object in the token response itself.
    async fn fetch_profile_or(&self, token_response: &ApiResponse) -> Option<UserProfile> {
        let response = self.inner.api.profile().await;
        let profile = profile_from(&response).or_else(|| {
            if !response.success {
                warn!(
                    status = response.status,
                    message = %response.message,
                    "profile fetch failed after sign-in"
                );
            }
            token_response
                .data
                .as_ref()
                .and_then(|d| d.get("user"))
                .and_then(|u| serde_json::from_value(u.clone()).ok())
        });
        if let Some(profile) = &profile {
            self.remember_profile(profile);
        }
        profile
    }

    /// A 401 whose refresh failed leaves no token behind.
    fn expire_if_token_lost(&self) {
        if !self.inner.api.has_token() {
            self.expire();
        }
    }

    /// Fail a sign-in whose fresh token was already rejected.
    fn ensure_token_survived(&self) -> Result<(), AuthError> {
        if self.inner.api.has_token() {
            return Ok(());
        }
        warn!("token rejected right after sign-in");
        self.expire();
        Err(AuthError::Api(ApiError::Status {
            status: 401,
            message: "Session expired. Please log in again.".to_string(),
            body: None,
        }))
    }

    fn sign_in(&self, user: Option<UserProfile>) {
        if let Some(user) = &user {
            set_sentry_user(user);
        }
        self.inner.state.send_modify(|s| s.sign_in(user));
    }

    fn remember_profile(&self, profile: &UserProfile) {
        if let Err(e) = persist::save_value(self.inner.store.as_ref(), USER_DATA_KEY, profile) {
            warn!(error = %e, "failed to cache user profile");
        }
    }

    fn forget_profile(&self) {
        if let Err(e) = self.inner.store.remove(USER_DATA_KEY) {
            warn!(error = %e, "failed to remove cached user profile");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::config::ApiConfig;
    use crate::storage::{ACCESS_TOKEN_KEY, KeyValueStore, MemoryStore};

    fn offline_session() -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = ApiConfig {
            base_url: Url::parse("http://127.0.0.1:9/api/").unwrap(),
            timeout: Duration::from_secs(2),
        };
        let api = ApiClient::new(&config, store.clone()).unwrap();
        (SessionManager::new(api, store.clone()), store)
    }

    #[test]
    fn test_starts_hydrating() {
        let (session, _) = offline_session();
        let state = session.state();
        assert_eq!(state.status, AuthStatus::Authenticating);
        assert!(state.is_loading);
    }

    #[tokio::test]
    async fn test_hydrate_without_token() {
        let (session, _) = offline_session();
        let state = session.hydrate().await;
        assert_eq!(state.status, AuthStatus::Unauthenticated);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_hydrate_offline_uses_cached_profile() {
        let (session, store) = offline_session();
        store.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        store
            .set(USER_DATA_KEY, r#"{"id":1,"name":"Asha","role":"user"}"#)
            .unwrap();

        let state = session.hydrate().await;
        assert_eq!(state.status, AuthStatus::Authenticated);
        assert_eq!(state.user.unwrap().name.as_deref(), Some("Asha"));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_logout_clears_state_when_backend_unreachable() {
        let (session, store) = offline_session();
        store.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        store.set(USER_DATA_KEY, r#"{"id":1}"#).unwrap();
        session.hydrate().await;
        assert!(session.is_authenticated());

        session.logout().await;
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(store.get(USER_DATA_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_signed_out() {
        let (session, _) = offline_session();
        session.hydrate().await;

        let err = session
            .login(&LoginRequest::new("ada@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Api(ApiError::Transport(_))));
        let state = session.state();
        assert_eq!(state.status, AuthStatus::Unauthenticated);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_expire_publishes_signed_out() {
        let (session, store) = offline_session();
        store.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        session.hydrate().await;
        let mut rx = session.subscribe();

        session.expire();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, AuthStatus::Unauthenticated);
        assert!(!session.has_token());
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let (session, _) = offline_session();
        session.hydrate().await;
        let err = session.update_profile(&Map::new()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }
}
