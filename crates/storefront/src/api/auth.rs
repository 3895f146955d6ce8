//! Authentication and account endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{instrument, warn};

use super::tokens::{AuthTokens, TokenPayload};
use super::{ApiClient, ApiError, ApiResponse};

/// Credentials for `POST auth/login`.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

impl LoginRequest {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Registration data for `POST auth/signup`.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Body for `POST auth/reset-password`.
#[derive(Debug, Clone)]
pub struct ResetPasswordRequest {
    /// Token from the reset email
    pub token: SecretString,
    pub password: SecretString,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Log in, storing the returned tokens on success.
    ///
    /// Tokens are stored only when the response succeeded and carries an
    /// `accessToken`.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginRequest) -> ApiResponse {
        let body = LoginBody {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        let response = self.post("auth/login", &body).await;
        self.store_tokens_from(&response);
        response
    }

    /// Register an account.
    ///
    /// Backends that sign the user in on registration return tokens, which
    /// are stored exactly as for [`login`](Self::login).
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn signup(&self, data: &SignupRequest) -> ApiResponse {
        let body = SignupBody {
            name: &data.name,
            email: &data.email,
            password: data.password.expose_secret(),
        };
        let response = self.post("auth/signup", &body).await;
        self.store_tokens_from(&response);
        response
    }

    /// Log out. Stored tokens are cleared whatever the server answers.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ApiResponse {
        let response = self.post("auth/logout", &json!({})).await;
        self.clear_tokens();
        response
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// Shares the single-flight lock with the automatic refresh-on-401.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is stored or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<AuthTokens, ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Fetch the signed-in user's profile.
    pub async fn profile(&self) -> ApiResponse {
        self.get("users/profile").await
    }

    /// Update fields of the signed-in user's profile.
    pub async fn update_profile(&self, changes: &Map<String, Value>) -> ApiResponse {
        self.put("users/profile", changes).await
    }

    /// Request a password reset email.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> ApiResponse {
        self.post("auth/forgot-password", &json!({ "email": email }))
            .await
    }

    /// Set a new password using a reset token.
    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> ApiResponse {
        let body = json!({
            "token": request.token.expose_secret(),
            "password": request.password.expose_secret(),
        });
        self.post("auth/reset-password", &body).await
    }

    fn store_tokens_from(&self, response: &ApiResponse) {
        if !response.success {
            return;
        }
        if let Some(tokens) = TokenPayload::extract(response.data.as_ref())
            && let Err(e) = self.inner.tokens.save(&tokens)
        {
            warn!(error = %e, "failed to persist tokens");
        }
    }
}
