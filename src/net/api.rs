//! Auth endpoint helpers.
//!
//! ERROR HANDLING
//! ==============
//! Login failures are returned to the caller verbatim (the form renders
//! them). Logout is best-effort: its error is reported but callers must not
//! let it block local sign-out.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use super::client::ApiClient;
use super::transport::ApiRequest;
use super::types::{Credentials, LoginResponse};
use crate::error::AuthError;

pub const LOGIN_PATH: &str = "/auth/login";
pub const VALIDATE_PATH: &str = "/auth/validate";
pub const LOGOUT_PATH: &str = "/auth/logout";

fn login_failed_message(status: u16, detail: &str) -> String {
    format!("login failed ({status}): {detail}")
}

/// `POST /auth/login`. Sent without interception or bearer token.
///
/// # Errors
///
/// - [`AuthError::Api`] when the backend rejects the credentials.
/// - [`AuthError::Network`] on transport failure.
/// - [`AuthError::Decode`] when the token pair is missing from the body.
pub async fn login(client: &ApiClient, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
    let request = ApiRequest::post(LOGIN_PATH).json(credentials)?;
    let response = client.send_anonymous(&request).await?;
    if !response.is_success() {
        return Err(AuthError::Api {
            status: response.status,
            message: login_failed_message(response.status, &response.error_message()),
        });
    }
    response.json::<LoginResponse>()
}

/// `POST /auth/logout`. Sent once with the current access token, never
/// refreshed.
///
/// # Errors
///
/// Returns the transport error or [`AuthError::Api`] for a non-success
/// status.
pub async fn logout(client: &ApiClient) -> Result<(), AuthError> {
    client
        .send_direct(&ApiRequest::post(LOGOUT_PATH))
        .await?
        .error_for_status()?;
    Ok(())
}
