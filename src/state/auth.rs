//! Auth-session state for the current process.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthContext` is the single writer of [`AuthState`]. Route guards and
//! user-aware callers read snapshots or subscribe to changes; they never
//! mutate state directly. One context is built at startup and shared by
//! reference (or `Arc`) for the life of the process.
//!
//! STATE MACHINE
//! =============
//! `Initializing` (loading, no user) resolves to `Authenticated` or
//! `Unauthenticated`. Every transition into `Unauthenticated` also clears
//! the token store. Concurrent login/logout calls are not coalesced; the
//! last transition written wins.

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use tokio::sync::watch;

use crate::error::AuthError;
use crate::net::api;
use crate::net::client::ApiClient;
use crate::net::transport::{ApiRequest, ApiResponse};
use crate::net::types::{Credentials, UserSession};
use crate::session::SessionValidator;

/// Authentication state tracking the current user and loading status.
///
/// `user == None` means "not authenticated" even if tokens are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserSession>,
    pub loading: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Initializing,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    #[must_use]
    pub fn initializing() -> Self {
        Self { user: None, loading: true }
    }

    #[must_use]
    pub fn authenticated(user: UserSession) -> Self {
        Self { user: Some(user), loading: false }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { user: None, loading: false }
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match (self.loading, &self.user) {
            (true, _) => AuthPhase::Initializing,
            (false, Some(_)) => AuthPhase::Authenticated,
            (false, None) => AuthPhase::Unauthenticated,
        }
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

pub struct AuthContext {
    client: ApiClient,
    validator: SessionValidator,
    state: watch::Sender<AuthState>,
}

impl AuthContext {
    /// Build a context in the `Initializing` state. Call
    /// [`AuthContext::initialize`] to resolve it.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(AuthState::initializing());
        let validator = SessionValidator::new(client.clone());
        Self { client, validator, state }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Silent startup validation. Failures are logged, never returned.
    pub async fn initialize(&self) -> AuthState {
        self.state.send_replace(AuthState::initializing());
        match self.validator.validate_session().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                self.state.send_replace(AuthState::authenticated(user));
            }
            Err(AuthError::NoToken) => {
                tracing::debug!("no stored session");
                self.sign_out_locally();
            }
            Err(e) if e.is_session_failure() => {
                tracing::info!(error = %e, code = e.error_code(), "stored session invalid");
                self.sign_out_locally();
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session check failed; treating as logged out");
                self.sign_out_locally();
            }
        }
        self.snapshot()
    }

    /// Log in, store the issued tokens, and become `Authenticated`.
    ///
    /// # Errors
    ///
    /// Returns the login/validation/storage failure unchanged so the form
    /// can render it; the context is left `Unauthenticated`.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        self.state.send_modify(|s| s.loading = true);
        match self.try_login(credentials).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "logged in");
                self.state.send_replace(AuthState::authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "login failed");
                self.sign_out_locally();
                Err(e)
            }
        }
    }

    async fn try_login(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        let response = api::login(&self.client, credentials).await?;
        self.client.tokens().set(&response.tokens())?;
        match response.user {
            Some(user) => Ok(user),
            None => self.validator.validate_session().await,
        }
    }

    /// Best-effort server invalidation, then unconditional local sign-out.
    pub async fn logout(&self) {
        self.state.send_modify(|s| s.loading = true);
        if let Err(e) = api::logout(&self.client).await {
            tracing::warn!(error = %e, "server-side logout failed; clearing local session anyway");
        }
        self.sign_out_locally();
        tracing::info!("logged out");
    }

    /// Authenticated request through the refresh interceptor. A session
    /// failure (in practice a failed refresh) ends the session; network and
    /// resource errors do not.
    ///
    /// # Errors
    ///
    /// Returns the client error unchanged.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let result = self.client.send(request).await;
        if let Err(e) = &result {
            if e.is_session_failure() {
                tracing::info!(error = %e, code = e.error_code(), "session ended by failed request");
                self.sign_out_locally();
            }
        }
        result
    }

    fn sign_out_locally(&self) {
        if let Err(e) = self.client.tokens().clear() {
            tracing::warn!(error = %e, "failed to clear token store");
        }
        self.state.send_replace(AuthState::unauthenticated());
    }
}
