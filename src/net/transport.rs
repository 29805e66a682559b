//! Raw HTTP transport.
//!
//! DESIGN
//! ======
//! `HttpTransport` is the seam between the interceptor and the network. The
//! reqwest implementation is a thin wrapper; tests substitute scripted
//! transports. Transports never retry and never touch the token store.

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use reqwest::Method;

use super::types::ErrorBody;
use crate::config::HttpTimeouts;
use crate::error::AuthError;

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// An outgoing API call. Immutable once built; the bearer token is supplied
/// separately on every attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/courses`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self { method: Method::POST, path: path.into(), body: None }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Decode`] if `body` cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, AuthError> {
        self.body = Some(serde_json::to_value(body).map_err(|e| AuthError::Decode(e.to_string()))?);
        Ok(self)
    }
}

/// A fully-read response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        serde_json::from_str(&self.body).map_err(|e| AuthError::Decode(e.to_string()))
    }

    /// Human-readable failure message: the backend's `message` field when
    /// present, otherwise the raw body, otherwise the status.
    #[must_use]
    pub fn error_message(&self) -> String {
        if let Ok(ErrorBody { message }) = serde_json::from_str::<ErrorBody>(&self.body) {
            return message;
        }
        let trimmed = self.body.trim();
        if trimmed.is_empty() { format!("status {}", self.status) } else { trimmed.to_owned() }
    }

    /// Convert a non-success status into [`AuthError::Api`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] for any status outside `200..300`.
    pub fn error_for_status(self) -> Result<Self, AuthError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AuthError::Api { status: self.status, message: self.error_message() })
        }
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` once, attaching `bearer` as `Authorization: Bearer …`
    /// when present.
    ///
    /// Any HTTP status is `Ok`; only transport failures are `Err`.
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, AuthError>;
}

/// reqwest-backed transport rooted at the API base URL.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport. Timeouts left as `None` use reqwest's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeouts.request_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = timeouts.connect_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| AuthError::Config(format!("http client build: {e}")))?;
        Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') { format!("{base_url}{path}") } else { format!("{base_url}/{path}") }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, AuthError> {
        let url = join_url(&self.base_url, &request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(method = %request.method, %url, status, "api response");
        Ok(ApiResponse { status, body })
    }
}
