//! Authenticated API client with the one-shot refresh interceptor.
//!
//! ARCHITECTURE
//! ============
//! Every intercepted request is wrapped in an [`Attempt`]. A 401 on the first
//! attempt triggers exactly one refresh; the retry is sent only after the
//! refresh future resolves. A 401 on the retry is final. Refresh, login and
//! logout bypass interception via [`ApiClient::send_direct`] so an auth
//! endpoint's 401 can never recurse into another refresh.
//!
//! TRADE-OFFS
//! ==========
//! Concurrent requests that all see a 401 each refresh independently; there
//! is no single-flight coalescing. Later refreshes may fail against a rotated
//! refresh token, which clears the store and surfaces `RefreshFailed`.

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::sync::Arc;

use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use super::types::{RefreshRequest, TokenPair};
use crate::error::AuthError;
use crate::token_store::{TokenKind, TokenStore};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Which send of the original request this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptNo {
    First,
    Retry,
}

/// A request paired with its attempt counter. Replaces a mutable
/// "already retried" flag on the request itself.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub request: ApiRequest,
    pub attempt: AttemptNo,
}

impl Attempt {
    #[must_use]
    pub fn first(request: ApiRequest) -> Self {
        Self { request, attempt: AttemptNo::First }
    }

    #[must_use]
    pub fn retry(self) -> Self {
        Self { request: self.request, attempt: AttemptNo::Retry }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { transport, tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Send `request` with the bearer token attached, refreshing once on 401.
    ///
    /// Any non-401 status, success or not, is returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`AuthError::RefreshFailed`] when the refresh after the first 401
    ///   fails; the token store has been cleared.
    /// - [`AuthError::Unauthorized`] when the retried request is also 401.
    /// - [`AuthError::Network`] on transport failure.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let mut attempt = Attempt::first(request);
        loop {
            let bearer = self.tokens.get(TokenKind::Access);
            let response = self.transport.execute(&attempt.request, bearer.as_deref()).await?;
            if !response.is_unauthorized() {
                return Ok(response);
            }

            match attempt.attempt {
                AttemptNo::Retry => {
                    tracing::warn!(path = %attempt.request.path, "request still unauthorized after refresh");
                    return Err(AuthError::Unauthorized);
                }
                AttemptNo::First => {
                    tracing::debug!(path = %attempt.request.path, "401 received; refreshing token");
                    if let Err(e) = self.refresh().await {
                        if let Err(clear_err) = self.tokens.clear() {
                            tracing::warn!(error = %clear_err, "failed to clear tokens after refresh failure");
                        }
                        return Err(e);
                    }
                    attempt = attempt.retry();
                }
            }
        }
    }

    /// Send without interception. The current access token is still attached.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] on transport failure.
    pub async fn send_direct(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let bearer = self.tokens.get(TokenKind::Access);
        self.transport.execute(request, bearer.as_deref()).await
    }

    /// Send without interception and without a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] on transport failure.
    pub async fn send_anonymous(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.transport.execute(request, None).await
    }

    /// Exchange the stored refresh token for a new pair and store it.
    ///
    /// Does not clear the store on failure; [`ApiClient::send`] does that.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshFailed`] for every failure: missing refresh
    /// token, rejected token, transport error or malformed body.
    pub async fn refresh(&self) -> Result<TokenPair, AuthError> {
        let refresh_token = self
            .tokens
            .get(TokenKind::Refresh)
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token".to_owned()))?;

        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshRequest { refresh_token: &refresh_token })
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        let response = self
            .transport
            .execute(&request, None)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        if !response.is_success() {
            return Err(AuthError::RefreshFailed(format!("status {}: {}", response.status, response.error_message())));
        }

        let pair: TokenPair = response.json().map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        self.tokens.set(&pair).map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        tracing::info!("access token refreshed");
        Ok(pair)
    }
}
