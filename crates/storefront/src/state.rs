//! Application state shared across the storefront.
//!
//! Every service is constructed once here and handed out by reference, so
//! callers (and tests) choose the storage backend and API endpoint instead
//! of reaching for globals.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::document::DocumentHead;
use crate::error::Result;
use crate::routing::RouteGate;
use crate::session::{SessionManager, SessionState};
use crate::storage::{FileStore, SharedStore};

/// Application state shared across the storefront.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: SharedStore,
    api: ApiClient,
    catalog: CatalogClient,
    session: SessionManager,
    gate: RouteGate,
    cart: Mutex<CartStore>,
    expiry_watcher: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        let watcher = self
            .expiry_watcher
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = watcher.take() {
            handle.abort();
        }
    }
}

impl AppState {
    /// Build the state over an existing store.
    ///
    /// The cart is hydrated from `store` immediately. The session starts in
    /// the hydrating state; call [`start`](Self::start) (or
    /// [`SessionManager::hydrate`] plus
    /// [`watch_session_expiry`](Self::watch_session_expiry)) before the
    /// first route check.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, store: SharedStore) -> Result<Self> {
        let api = ApiClient::new(&config.api, store.clone())?;
        let catalog = CatalogClient::new(api.clone(), config.catalog_cache_ttl);
        let session = SessionManager::new(api.clone(), store.clone());
        let gate = RouteGate::new(session.clone(), Arc::new(DocumentHead::new()));
        let cart = Mutex::new(CartStore::load(store.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                api,
                catalog,
                session,
                gate,
                cart,
                expiry_watcher: Mutex::new(None),
            }),
        })
    }

    /// Build the state over the JSON file named by `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the HTTP
    /// client cannot be built.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let store: SharedStore = Arc::new(FileStore::open(&config.storage_path)?);
        Self::new(config, store)
    }

    /// Start the expiry watcher and restore the session from storage.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn start(&self) -> SessionState {
        self.watch_session_expiry();
        self.inner.session.hydrate().await
    }

    /// Sign the session out whenever the API client gives up on a token
    /// refresh. Idempotent; the watcher stops when the state is dropped.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn watch_session_expiry(&self) {
        let mut watcher = self
            .inner
            .expiry_watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if watcher.as_ref().is_none_or(JoinHandle::is_finished) {
            *watcher = Some(self.inner.session.watch_expiry());
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    #[must_use]
    pub fn gate(&self) -> &RouteGate {
        &self.inner.gate
    }

    /// Lock the cart and wishlist for reading or mutation.
    pub fn cart(&self) -> MutexGuard<'_, CartStore> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
