//! Bearer token persistence.
//!
//! Tokens are stored as raw strings (not JSON) under [`ACCESS_TOKEN_KEY`] and
//! [`REFRESH_TOKEN_KEY`], and held in memory only as [`SecretString`].

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use crate::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SharedStore, StorageError};

/// Token pair returned by the login and refresh endpoints.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

/// Wire shape of a token-bearing response body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenPayload {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl TokenPayload {
    /// Extract tokens from a response body, if it carries an access token.
    pub(crate) fn extract(body: Option<&serde_json::Value>) -> Option<AuthTokens> {
        let payload: Self = serde_json::from_value(body?.clone()).ok()?;
        let access_token = payload.access_token.filter(|t| !t.is_empty())?;
        Some(AuthTokens {
            access_token: SecretString::from(access_token),
            refresh_token: payload
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        })
    }
}

/// Reads and writes the token pair in the key-value store.
#[derive(Clone)]
pub(crate) struct TokenStore {
    store: SharedStore,
}

impl TokenStore {
    pub(crate) fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub(crate) fn access_token(&self) -> Option<SecretString> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub(crate) fn refresh_token(&self) -> Option<SecretString> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Store `tokens`. A pair without a refresh token keeps the stored one.
    pub(crate) fn save(&self, tokens: &AuthTokens) -> Result<(), StorageError> {
        self.store
            .set(ACCESS_TOKEN_KEY, tokens.access_token.expose_secret())?;
        if let Some(refresh) = &tokens.refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh.expose_secret())?;
        }
        Ok(())
    }

    /// Remove both tokens. Both removals are attempted even if one fails.
    pub(crate) fn clear(&self) -> Result<(), StorageError> {
        let access = self.store.remove(ACCESS_TOKEN_KEY);
        let refresh = self.store.remove(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }

    fn read(&self, key: &str) -> Option<SecretString> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(key, error = %e, "failed to read token, treating as absent");
                None
            }
        }
    }
}
