//! Session operation errors.

use thiserror::Error;

use crate::api::ApiError;

/// Errors returned by [`SessionManager`](super::SessionManager) operations.
///
/// Expected failures (bad credentials, unreachable backend) come back as
/// values of this type; no session operation panics.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend rejected the credentials.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Login succeeded but the response carried no access token.
    #[error("login response did not include an access token")]
    MissingToken,

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Map a failed login or signup call, treating 400/401/403 as a
    /// credentials problem the user can correct.
    pub(crate) fn from_credentials_failure(err: ApiError) -> Self {
        match err {
            ApiError::Status {
                status: 400 | 401 | 403,
                message,
                ..
            } => Self::InvalidCredentials(message),
            other => Self::Api(other),
        }
    }
}
