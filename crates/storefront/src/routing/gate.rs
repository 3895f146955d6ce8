//! Route authorization gate.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Protected route and no stored token: redirect to the login page. This
//!    reads storage only and does not wait for hydration.
//! 2. Session still loading: show a placeholder, decide later.
//! 3. Guest-only route and signed in: redirect to its `redirect_if_auth`.
//! 4. Protected route and not signed in: redirect to the login page.
//! 5. Role required and the user's role differs: redirect to `/401`.
//! 6. Otherwise allow.
//!
//! Login redirects carry the original pathname (query and fragment dropped)
//! in a URL-encoded `redirect` query parameter so the login flow can send
//! the user back.

use std::sync::Arc;

use tracing::debug;

use super::table::{RouteConfig, RouteMeta, paths, route_by_path};
use crate::document::DocumentHead;
use crate::session::{SessionManager, SessionState};

/// What to render for a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the route.
    Allow,
    /// Render a loading placeholder; the session is still hydrating.
    Loading,
    /// Navigate to this path (with query) instead.
    Redirect(String),
}

fn login_redirect(meta: &RouteMeta, path: &str) -> GateDecision {
    let target = meta.redirect_unauth.unwrap_or(paths::LOGIN);
    let pathname = path.split(['?', '#']).next().unwrap_or(path);
    GateDecision::Redirect(format!("{target}?redirect={}", urlencoding::encode(pathname)))
}

/// Decide access to a route. Pure; performs no I/O.
///
/// `has_token` is the storage-only token check; `session` is the hydrated
/// session state.
#[must_use]
pub fn decide(meta: &RouteMeta, session: &SessionState, has_token: bool, path: &str) -> GateDecision {
    if meta.requires_auth && !has_token {
        return login_redirect(meta, path);
    }
    if session.is_loading {
        return GateDecision::Loading;
    }
    if let Some(target) = meta.redirect_if_auth
        && session.is_authenticated()
    {
        return GateDecision::Redirect(target.to_string());
    }
    if meta.requires_auth && !session.is_authenticated() {
        return login_redirect(meta, path);
    }
    if let Some(role) = meta.required_role
        && session.role() != Some(role)
    {
        return GateDecision::Redirect(paths::UNAUTHORIZED.to_string());
    }
    GateDecision::Allow
}

/// Applies [`decide`] against a live session and keeps the document head
/// in step with the allowed route.
#[derive(Debug, Clone)]
pub struct RouteGate {
    session: SessionManager,
    document: Arc<DocumentHead>,
}

impl RouteGate {
    #[must_use]
    pub const fn new(session: SessionManager, document: Arc<DocumentHead>) -> Self {
        Self { session, document }
    }

    /// Check navigation to `path`, which was resolved to `route`.
    pub fn check(&self, route: &RouteConfig, path: &str) -> GateDecision {
        let decision = decide(
            &route.meta,
            &self.session.state(),
            self.session.has_token(),
            path,
        );
        if decision == GateDecision::Allow {
            self.document.apply(&route.meta);
        }
        debug!(path, route = route.name, ?decision, "route gate decision");
        decision
    }

    /// Resolve `path` in the route table and check it. Unknown paths
    /// redirect to the not-found page.
    pub fn check_path(&self, path: &str) -> GateDecision {
        match route_by_path(path) {
            Some(route) => self.check(route, path),
            None => GateDecision::Redirect(paths::NOT_FOUND.to_string()),
        }
    }

    #[must_use]
    pub fn document(&self) -> &DocumentHead {
        &self.document
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use driphub_core::UserProfile;

    use super::*;
    use crate::session::AuthStatus;

    fn meta(path: &str) -> RouteMeta {
        route_by_path(path).unwrap().meta
    }

    fn signed_in(role: Option<&str>) -> SessionState {
        let mut state = SessionState::signed_out();
        state.status = AuthStatus::Authenticated;
        state.user = Some(UserProfile {
            role: role.map(str::to_string),
            ..UserProfile::default()
        });
        state
    }

    #[test]
    fn test_protected_without_token_redirects_before_hydration() {
        let decision = decide(
            &meta("/checkout"),
            &SessionState::hydrating(),
            false,
            "/checkout",
        );
        assert_eq!(
            decision,
            GateDecision::Redirect("/login?redirect=%2Fcheckout".to_string())
        );
    }

    #[test]
    fn test_login_redirect_keeps_pathname_only() {
        let decision = decide(
            &meta("/account/orders"),
            &SessionState::signed_out(),
            false,
            "/account/orders?page=2#recent",
        );
        assert_eq!(
            decision,
            GateDecision::Redirect("/login?redirect=%2Faccount%2Forders".to_string())
        );
    }

    #[test]
    fn test_loading_defers_decision() {
        let decision = decide(&meta("/checkout"), &SessionState::hydrating(), true, "/checkout");
        assert_eq!(decision, GateDecision::Loading);

        let decision = decide(&meta("/login"), &SessionState::hydrating(), false, "/login");
        assert_eq!(decision, GateDecision::Loading);
    }

    #[test]
    fn test_signed_in_user_kept_off_login() {
        let decision = decide(&meta("/login"), &signed_in(None), true, "/login");
        assert_eq!(decision, GateDecision::Redirect("/".to_string()));
    }

    #[test]
    fn test_rejected_token_redirects_after_hydration() {
        let decision = decide(
            &meta("/account/orders"),
            &SessionState::signed_out(),
            true,
            "/account/orders",
        );
        assert_eq!(
            decision,
            GateDecision::Redirect("/login?redirect=%2Faccount%2Forders".to_string())
        );
    }

    #[test]
    fn test_role_check() {
        let admin = meta("/admin");
        assert_eq!(
            decide(&admin, &signed_in(Some("user")), true, "/admin"),
            GateDecision::Redirect("/401".to_string())
        );
        assert_eq!(
            decide(&admin, &signed_in(None), true, "/admin"),
            GateDecision::Redirect("/401".to_string())
        );
        assert_eq!(
            decide(&admin, &signed_in(Some("admin")), true, "/admin"),
            GateDecision::Allow
        );
    }

    #[test]
    fn test_public_and_custom_redirect() {
        assert_eq!(
            decide(&meta("/products"), &SessionState::signed_out(), false, "/products"),
            GateDecision::Allow
        );

        let custom = RouteMeta {
            requires_auth: true,
            redirect_unauth: Some("/signup"),
            ..RouteMeta::public("Members", "Members only")
        };
        assert_eq!(
            decide(&custom, &SessionState::signed_out(), false, "/members/deals?x=1"),
            GateDecision::Redirect("/signup?redirect=%2Fmembers%2Fdeals".to_string())
        );
    }
}
