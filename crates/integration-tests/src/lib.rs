//! Integration tests for the DripHub storefront client.
//!
//! Every test runs the real [`ApiClient`] and [`SessionManager`] against a
//! `wiremock` backend mounted under `/api/`, with an in-memory store, so no
//! network or disk setup is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p driphub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - Envelope handling, bearer tokens, refresh on 401, catalog cache
//! - `session_manager` - Login, registration, logout, hydration, expiry
//! - `route_gate` - Route decisions across the whole route table
//! - `app_state` - The assembled services reacting to a failed token refresh

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use driphub_storefront::api::ApiClient;
use driphub_storefront::config::{ApiConfig, StorefrontConfig};
use driphub_storefront::session::SessionManager;
use driphub_storefront::state::AppState;
use driphub_storefront::storage::{
    ACCESS_TOKEN_KEY, KeyValueStore, MemoryStore, REFRESH_TOKEN_KEY, SharedStore,
};
use url::Url;
use wiremock::MockServer;

/// Mount point of the mocked REST API on the mock server.
pub const API_PREFIX: &str = "/api";

/// Path of `suffix` on the mock server, e.g. `api_path("auth/login")`.
#[must_use]
pub fn api_path(suffix: &str) -> String {
    format!("{API_PREFIX}/{suffix}")
}

/// A mock backend plus a client wired to it.
pub struct TestBackend {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub api: ApiClient,
}

impl TestBackend {
    /// Start a mock server and build a client against its `/api/` root.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = Url::parse(&format!("{}{API_PREFIX}/", server.uri())).unwrap();
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        let api = ApiClient::new(&ApiConfig::new(base_url), shared).unwrap();
        Self { server, store, api }
    }

    /// A session manager over this backend's client and store.
    #[must_use]
    pub fn session(&self) -> SessionManager {
        let shared: SharedStore = self.store.clone();
        SessionManager::new(self.api.clone(), shared)
    }

    /// The full application state over this backend's mock server and store.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or HTTP client cannot be built.
    #[allow(clippy::unwrap_used)]
    pub fn app_state(&self) -> AppState {
        let api_url = format!("{}{API_PREFIX}/", self.server.uri());
        let config = StorefrontConfig::from_lookup(|key| {
            (key == "DRIPHUB_API_URL").then(|| api_url.clone())
        })
        .unwrap();
        let shared: SharedStore = self.store.clone();
        AppState::new(config, shared).unwrap()
    }

    /// Store tokens as a previous login would have.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory store rejects the write.
    #[allow(clippy::unwrap_used)]
    pub fn seed_tokens(&self, access: &str, refresh: Option<&str>) {
        self.store.set(ACCESS_TOKEN_KEY, access).unwrap();
        if let Some(refresh) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh).unwrap();
        }
    }

    /// Raw stored value under `key`.
    #[must_use]
    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).ok().flatten()
    }
}
