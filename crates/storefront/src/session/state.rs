//! Observable session state.

use chrono::{DateTime, Utc};
use driphub_core::UserProfile;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Hydration, login or registration is in flight.
    Authenticating,
    Unauthenticated,
    /// Token held and profile loaded.
    Authenticated,
    /// Token held but the profile could not be fetched.
    AuthenticatedNoProfile,
}

/// Snapshot published to subscribers on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: AuthStatus,
    pub user: Option<UserProfile>,
    /// True while hydration, login or registration runs
    pub is_loading: bool,
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// State before hydration has run.
    #[must_use]
    pub const fn hydrating() -> Self {
        Self {
            status: AuthStatus::Authenticating,
            user: None,
            is_loading: true,
            authenticated_at: None,
        }
    }

    /// Signed-out state.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            user: None,
            is_loading: false,
            authenticated_at: None,
        }
    }

    /// Whether a token has been accepted, with or without a profile.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(
            self.status,
            AuthStatus::Authenticated | AuthStatus::AuthenticatedNoProfile
        )
    }

    /// The signed-in user's role, if known.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.role.as_deref())
    }

    pub(crate) fn sign_in(&mut self, user: Option<UserProfile>) {
        self.status = if user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::AuthenticatedNoProfile
        };
        self.user = user;
        self.authenticated_at.get_or_insert_with(Utc::now);
    }

    pub(crate) fn sign_out(&mut self) {
        self.status = AuthStatus::Unauthenticated;
        self.user = None;
        self.authenticated_at = None;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::hydrating()
    }
}
