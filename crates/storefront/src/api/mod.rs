//! Remote API client for the DripHub REST backend.
//!
//! Every call resolves to an [`ApiResponse`] envelope; transport failures are
//! folded into the envelope rather than returned as `Err`.
//!
//! # Authentication
//!
//! The access token from storage is attached as a bearer token. A 401 on an
//! authenticated request triggers one refresh (`POST auth/refresh`) and one
//! replay of the request. Refreshes are single-flight: requests that hit 401
//! while a refresh is running wait for it and replay with the new token. If
//! the refresh fails, tokens are cleared, waiters fail with their original
//! 401, and [`ApiEvent::SessionExpired`] is broadcast.
//!
//! # Example
//!
//! ```rust,ignore
//! use driphub_storefront::api::{ApiClient, LoginRequest};
//!
//! let api = ApiClient::new(&config.api, store.clone())?;
//! let response = api.login(&LoginRequest::new("ada@example.com", "Secret#123")).await;
//! if response.success {
//!     let profile = api.profile().await;
//! }
//! ```

mod auth;
mod envelope;
mod tokens;

pub use auth::{LoginRequest, ResetPasswordRequest, SignupRequest};
pub use envelope::ApiResponse;
pub use tokens::AuthTokens;

use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::storage::SharedStore;
use tokens::TokenStore;

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const REFRESH_PATH: &str = "auth/refresh";

/// Errors derived from a failed API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection, DNS, timeout).
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("request failed ({status}): {message}")]
    Status {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The response data did not have the expected shape.
    #[error("unexpected response data: {0}")]
    Decode(#[source] serde_json::Error),

    /// A refresh was needed but no refresh token is stored.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status, if the server responded.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Session-level events raised by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEvent {
    /// A token refresh failed and the stored tokens were cleared.
    SessionExpired,
}

/// Client for the REST backend. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<ApiEvent>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config`, persisting tokens in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, store: SharedStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("DripHub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                tokens: TokenStore::new(store),
                refresh_lock: Mutex::new(()),
                events,
            }),
        })
    }

    /// Base URL endpoint paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Subscribe to session events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ApiEvent> {
        self.inner.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generic Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// `GET` an endpoint.
    pub async fn get(&self, path: &str) -> ApiResponse {
        self.request(Method::GET, path, &[], None).await
    }

    /// `GET` an endpoint with query parameters.
    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> ApiResponse {
        self.request(Method::GET, path, query, None).await
    }

    /// `POST` a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        self.request_with_body(Method::POST, path, body).await
    }

    /// `PUT` a JSON body.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        self.request_with_body(Method::PUT, path, body).await
    }

    /// `PATCH` a JSON body.
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        self.request_with_body(Method::PATCH, path, body).await
    }

    /// `DELETE` an endpoint.
    pub async fn delete(&self, path: &str) -> ApiResponse {
        self.request(Method::DELETE, path, &[], None).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// The stored access token, if any.
    #[must_use]
    pub fn current_token(&self) -> Option<SecretString> {
        self.inner.tokens.access_token()
    }

    /// Whether an access token is stored. Storage-only; makes no request.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    /// Remove both stored tokens, logging any storage failure.
    pub fn clear_tokens(&self) {
        if let Err(e) = self.inner.tokens.clear() {
            warn!(error = %e, "failed to clear stored tokens");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request Pipeline
    // ─────────────────────────────────────────────────────────────────────────

    async fn request_with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResponse {
        match serde_json::to_value(body) {
            Ok(body) => self.request(method, path, &[], Some(body)).await,
            Err(e) => ApiResponse::transport(format!("failed to encode request body: {e}")),
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> ApiResponse {
        let url = match self.endpoint(path, query) {
            Ok(url) => url,
            Err(e) => return ApiResponse::transport(format!("invalid endpoint '{path}': {e}")),
        };

        let sent_token = self.inner.tokens.access_token();
        let response = self
            .send(&method, &url, body.as_ref(), sent_token.as_ref())
            .await;

        // Only requests that carried a token are eligible for refresh; a 401
        // on an anonymous call (bad login credentials) is returned as is.
        let Some(sent_token) = sent_token else {
            return response;
        };
        if !response.is_unauthorized() || path.trim_start_matches('/') == REFRESH_PATH {
            return response;
        }

        match self.refresh_after_unauthorized(&sent_token).await {
            Some(token) => {
                debug!(%method, path, "replaying request with refreshed token");
                self.send(&method, &url, body.as_ref(), Some(&token)).await
            }
            None => response,
        }
    }

    /// Obtain a token to replay a request that was rejected with `sent`.
    ///
    /// Runs under the refresh lock. If another caller already rotated the
    /// token, that token is reused; if tokens were cleared by a failed
    /// refresh, returns `None` without trying again.
    async fn refresh_after_unauthorized(&self, sent: &SecretString) -> Option<SecretString> {
        let _guard = self.inner.refresh_lock.lock().await;

        let current = self.inner.tokens.access_token()?;
        if current.expose_secret() != sent.expose_secret() {
            return Some(current);
        }

        match self.refresh_locked().await {
            Ok(tokens) => Some(tokens.access_token),
            Err(e) => {
                error!(error = %e, "token refresh failed, clearing session");
                self.clear_tokens();
                let _ = self.inner.events.send(ApiEvent::SessionExpired);
                None
            }
        }
    }

    /// Exchange the refresh token for a new pair. Caller holds the lock.
    async fn refresh_locked(&self) -> Result<AuthTokens, ApiError> {
        let refresh_token = self
            .inner
            .tokens
            .refresh_token()
            .ok_or(ApiError::NoRefreshToken)?;
        let url = self
            .endpoint(REFRESH_PATH, &[])
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = serde_json::json!({ "refreshToken": refresh_token.expose_secret() });

        let response = self.send(&Method::POST, &url, Some(&body), None).await;
        if !response.success {
            return Err(response.into_error());
        }
        let tokens = tokens::TokenPayload::extract(response.data.as_ref()).ok_or_else(|| {
            ApiError::Status {
                status: response.status,
                message: "refresh response did not include an access token".to_string(),
                body: None,
            }
        })?;

        if let Err(e) = self.inner.tokens.save(&tokens) {
            warn!(error = %e, "failed to persist refreshed tokens");
        }
        debug!("access token refreshed");
        Ok(tokens)
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        token: Option<&SecretString>,
    ) -> ApiResponse {
        let request_id = Uuid::new_v4();
        debug!(%method, %url, %request_id, authenticated = token.is_some(), "sending API request");

        let mut request = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, %url, %request_id, error = %e, "API request failed");
                return ApiResponse::transport(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%method, %url, %request_id, error = %e, "failed to read API response");
                return ApiResponse::transport(e.to_string());
            }
        };
        debug!(%method, %url, %request_id, status, "API response received");

        ApiResponse::from_parts(status, ApiResponse::parse_body(&text))
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, url::ParseError> {
        let mut url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}
