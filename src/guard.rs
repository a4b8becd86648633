//! Route guard: the one place navigation is gated by authentication and
//! role.
//!
//! The decision is a pure function of the current session snapshot and the
//! requested route, so every screen shares the same logic instead of
//! re-implementing role checks. The cached role is trusted between profile
//! refreshes; a server-side demotion takes effect on the next fetch.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::net::types::{User, UserRole};
use crate::state::session::SessionSnapshot;

/// A navigation target and the roles allowed to view it (`None` means any
/// authenticated user).
#[derive(Clone, Copy, Debug)]
pub struct RouteRequest<'a> {
    pub path: &'a str,
    pub allowed_roles: Option<&'a [UserRole]>,
}

impl<'a> RouteRequest<'a> {
    #[must_use]
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            allowed_roles: None,
        }
    }

    #[must_use]
    pub fn with_roles(mut self, allowed: &'a [UserRole]) -> Self {
        self.allowed_roles = Some(allowed);
        self
    }
}

/// Outcome of a guard evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session restore or login still in flight: show a neutral loading
    /// indicator, never flash a redirect.
    Loading,
    /// Render the requested view.
    Render,
    /// Not authenticated: go to login, remembering where the user was
    /// headed so login can return them there.
    RedirectToLogin { from: String },
    /// Authenticated but not permitted: go to the unauthorized view, not to
    /// login.
    RedirectToUnauthorized,
}

/// Does the user hold one of the allowed roles?
#[must_use]
pub fn has_role(user: &User, allowed: &[UserRole]) -> bool {
    allowed.contains(&user.role)
}

/// Decide whether the requested view may render.
#[must_use]
pub fn evaluate(snapshot: &SessionSnapshot, request: &RouteRequest<'_>) -> RouteDecision {
    if snapshot.loading {
        return RouteDecision::Loading;
    }

    if !snapshot.is_authenticated() {
        return RouteDecision::RedirectToLogin {
            from: request.path.to_owned(),
        };
    }

    if let Some(allowed) = request.allowed_roles {
        let permitted = snapshot.user.as_ref().is_some_and(|user| has_role(user, allowed));
        if !permitted {
            return RouteDecision::RedirectToUnauthorized;
        }
    }

    RouteDecision::Render
}
