//! DripHub storefront client library.
//!
//! Client-side state and service layer for the DripHub store:
//!
//! - [`cart::CartStore`] keeps the cart and wishlist, written through to a
//!   [`storage::KeyValueStore`] on every change
//! - [`api::ApiClient`] talks to the REST backend and handles bearer tokens
//!   with single-flight refresh
//! - [`session::SessionManager`] owns the authentication session
//! - [`routing::RouteGate`] decides whether a route may be shown
//! - [`state::AppState`] wires them together once at startup
//!
//! # Example
//!
//! ```rust,ignore
//! use driphub_storefront::{config::StorefrontConfig, state::AppState, telemetry};
//!
//! let config = StorefrontConfig::from_env()?;
//! let _sentry = telemetry::init(&config);
//! let state = AppState::open(config)?;
//! state.session().hydrate().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod persist;
pub mod routing;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod validation;
