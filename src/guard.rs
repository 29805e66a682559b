//! Route guards.
//!
//! SYSTEM CONTEXT
//! ==============
//! Guards are pure functions of [`AuthState`] that return a [`Decision`]. The
//! caller executes the intent ([`apply_decision`]); guard code never logs out
//! or navigates by itself. [`GuardWatch`] re-runs a guard on every auth-state
//! change, not just once at mount.
//!
//! TRADE-OFFS
//! ==========
//! The two guard shapes disagree on insufficient privilege: `ProtectedRoute`
//! treats a role mismatch as an authentication failure (logout, `/login`),
//! while `LayoutGuard` sends the user to `/unauthorized` and keeps the
//! session. Both behaviors are kept as-is pending a product decision.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use tokio::sync::watch;

use crate::net::types::UserSession;
use crate::state::auth::{AuthContext, AuthState};

pub const LOGIN_ROUTE: &str = "/login";
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";

/// Path prefixes that require a session.
pub const PROTECTED_PREFIXES: [&str; 4] = ["/admin", "/dashboard", "/educator", "/courses/access"];

/// Navigation intent returned to the shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigateTo(pub String);

impl NavigateTo {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Session still resolving; show a spinner.
    Pending,
    Render,
    Navigate(NavigateTo),
    /// End the session, then navigate.
    LogoutAndNavigate(NavigateTo),
}

pub trait Guard {
    fn check(&self, state: &AuthState) -> Decision;
}

// =============================================================================
// PROTECTED ROUTE
// =============================================================================

/// Declarative wrapper guard with an optional exact role requirement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtectedRoute {
    pub required_role: Option<String>,
}

impl ProtectedRoute {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_role(role: impl Into<String>) -> Self {
        Self { required_role: Some(role.into()) }
    }
}

impl Guard for ProtectedRoute {
    fn check(&self, state: &AuthState) -> Decision {
        if state.loading {
            return Decision::Pending;
        }
        let Some(user) = &state.user else {
            return Decision::Navigate(NavigateTo(LOGIN_ROUTE.to_owned()));
        };
        if let Some(role) = &self.required_role {
            if user.role != *role {
                return Decision::LogoutAndNavigate(NavigateTo(LOGIN_ROUTE.to_owned()));
            }
        }
        Decision::Render
    }
}

// =============================================================================
// LAYOUT GUARD
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Admin,
    Educator,
}

impl Capability {
    #[must_use]
    pub fn granted_to(self, user: &UserSession) -> bool {
        match self {
            Self::Admin => user.is_admin,
            Self::Educator => user.is_educator,
        }
    }
}

/// Area-level guard checking a capability flag rather than a role string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutGuard {
    pub capability: Capability,
}

impl LayoutGuard {
    #[must_use]
    pub fn new(capability: Capability) -> Self {
        Self { capability }
    }
}

impl Guard for LayoutGuard {
    fn check(&self, state: &AuthState) -> Decision {
        if state.loading {
            return Decision::Pending;
        }
        match &state.user {
            Some(user) if self.capability.granted_to(user) => Decision::Render,
            _ => Decision::Navigate(NavigateTo(UNAUTHORIZED_ROUTE.to_owned())),
        }
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    Public,
    Protected(ProtectedRoute),
    Layout(LayoutGuard),
}

impl Guard for RouteGuard {
    fn check(&self, state: &AuthState) -> Decision {
        match self {
            Self::Public => Decision::Render,
            Self::Protected(g) => g.check(state),
            Self::Layout(g) => g.check(state),
        }
    }
}

/// `true` when `path` is `prefix` or lies beneath it by whole segments.
/// Query strings and fragments are ignored.
#[must_use]
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[must_use]
pub fn is_protected_path(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| matches_prefix(path, prefix))
}

/// Guard that applies to `path` in the Learn Sphere route table.
///
/// No route in the table carries a `required_role`; the admin and educator
/// areas are gated by capability flags instead. A role-gated page must be
/// wired in by the embedding shell with [`ProtectedRoute::with_role`] and
/// passed to [`enter`], which is the only path that yields
/// [`Decision::LogoutAndNavigate`].
#[must_use]
pub fn route_guard(path: &str) -> RouteGuard {
    if matches_prefix(path, "/admin") {
        RouteGuard::Layout(LayoutGuard::new(Capability::Admin))
    } else if matches_prefix(path, "/educator") {
        RouteGuard::Layout(LayoutGuard::new(Capability::Educator))
    } else if is_protected_path(path) {
        RouteGuard::Protected(ProtectedRoute::new())
    } else {
        RouteGuard::Public
    }
}

// =============================================================================
// REACTIVE EVALUATION
// =============================================================================

/// Re-evaluates a guard whenever the auth state changes.
pub struct GuardWatch<G> {
    guard: G,
    rx: watch::Receiver<AuthState>,
    last: Option<Decision>,
}

impl<G: Guard> GuardWatch<G> {
    #[must_use]
    pub fn new(guard: G, rx: watch::Receiver<AuthState>) -> Self {
        Self { guard, rx, last: None }
    }

    /// Evaluate against the latest state.
    pub fn current(&mut self) -> Decision {
        let decision = {
            let state = self.rx.borrow_and_update();
            self.guard.check(&state)
        };
        self.last = Some(decision.clone());
        decision
    }

    /// Wait for the next state change that alters the decision. `None` once
    /// the auth context is gone.
    pub async fn next(&mut self) -> Option<Decision> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let decision = {
                let state = self.rx.borrow_and_update();
                self.guard.check(&state)
            };
            if self.last.as_ref() != Some(&decision) {
                self.last = Some(decision.clone());
                return Some(decision);
            }
        }
    }

    /// First decision that is not [`Decision::Pending`].
    pub async fn settle(&mut self) -> Option<Decision> {
        let mut decision = self.current();
        while decision == Decision::Pending {
            decision = self.next().await?;
        }
        Some(decision)
    }
}

/// Execute a guard decision against the context. Returns where to navigate,
/// or `None` when the caller should render (or keep waiting).
pub async fn apply_decision(decision: &Decision, ctx: &AuthContext) -> Option<NavigateTo> {
    match decision {
        Decision::Pending | Decision::Render => None,
        Decision::Navigate(to) => {
            tracing::debug!(to = to.path(), "guard redirect");
            Some(to.clone())
        }
        Decision::LogoutAndNavigate(to) => {
            tracing::info!(to = to.path(), "guard forced logout");
            ctx.logout().await;
            Some(to.clone())
        }
    }
}

/// Mount a route the way the frontend shell does: public routes render
/// immediately, guarded routes wait for startup validation to settle and then
/// execute the decision. Returns where to navigate, or `None` to render.
pub async fn enter(route: RouteGuard, ctx: &AuthContext) -> Option<NavigateTo> {
    let decision = if route == RouteGuard::Public {
        route.check(&ctx.snapshot())
    } else {
        let mut watch = GuardWatch::new(route, ctx.subscribe());
        ctx.initialize().await;
        watch.settle().await.unwrap_or(Decision::Pending)
    };
    apply_decision(&decision, ctx).await
}

/// [`enter`] for `path` using the route table.
pub async fn enter_path(path: &str, ctx: &AuthContext) -> Option<NavigateTo> {
    enter(route_guard(path), ctx).await
}
