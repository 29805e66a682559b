//! Session validation against the backend.
//!
//! Every call hits `/auth/validate`; nothing is cached. Expired access tokens
//! are refreshed by the interceptor before the validator sees a result.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use crate::error::AuthError;
use crate::net::api::VALIDATE_PATH;
use crate::net::client::ApiClient;
use crate::net::transport::ApiRequest;
use crate::net::types::{UserSession, ValidateResponse};

#[derive(Clone)]
pub struct SessionValidator {
    client: ApiClient,
}

impl SessionValidator {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Confirm the stored credentials map to a live user.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoToken`] when the store holds neither token.
    /// - [`AuthError::ValidationFailed`] when the backend rejects the session
    ///   (including a 401 that survives the refresh retry) or returns a body
    ///   that is not a user.
    /// - [`AuthError::RefreshFailed`] / [`AuthError::Network`] from the client.
    pub async fn validate_session(&self) -> Result<UserSession, AuthError> {
        if self.client.tokens().is_empty() {
            return Err(AuthError::NoToken);
        }

        let response = match self.client.send(ApiRequest::get(VALIDATE_PATH)).await {
            Ok(response) => response,
            Err(AuthError::Unauthorized) => {
                return Err(AuthError::ValidationFailed("session rejected".to_owned()));
            }
            Err(e) => return Err(e),
        };
        if !response.is_success() {
            return Err(AuthError::ValidationFailed(format!(
                "status {}: {}",
                response.status,
                response.error_message()
            )));
        }

        let body: ValidateResponse = response.json().map_err(|e| AuthError::ValidationFailed(e.to_string()))?;
        let user = body.into_user();
        tracing::debug!(user_id = %user.id, role = %user.role, "session validated");
        Ok(user)
    }
}
