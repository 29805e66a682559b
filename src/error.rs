//! Error type shared by the session client.
//!
//! ERROR HANDLING
//! ==============
//! The interceptor resolves a single 401 locally and only surfaces auth
//! failures once its one refresh attempt is spent. The auth context uses
//! [`AuthError::is_session_failure`] to decide whether a failed request ends
//! the session; transport and resource errors leave it in place.

/// Errors produced by token storage, the HTTP client and the auth context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credentials are present in the token store.
    #[error("no session token present")]
    NoToken,

    /// The refresh endpoint rejected the refresh token or was unreachable.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The session endpoint rejected the token.
    #[error("session validation failed: {0}")]
    ValidationFailed(String),

    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The retried request was still rejected with 401.
    #[error("request unauthorized after token refresh")]
    Unauthorized,

    /// The backend answered with a non-success status.
    #[error("api error: status {status}: {message}")]
    Api { status: u16, message: String },

    /// Input rejected locally before any request was sent.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// A response body could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The token store could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),
}

impl AuthError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoToken => "E_NO_TOKEN",
            Self::RefreshFailed(_) => "E_REFRESH_FAILED",
            Self::ValidationFailed(_) => "E_VALIDATION_FAILED",
            Self::Network(_) => "E_NETWORK",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Api { .. } => "E_API",
            Self::InvalidInput(_) => "E_INVALID_INPUT",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::Config(_) => "E_CONFIG",
        }
    }

    /// `true` when the stored credentials are gone or rejected, so the user
    /// must be treated as logged out. A 401 that survives a successful
    /// refresh is a resource-level rejection and does not count.
    #[must_use]
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::NoToken | Self::RefreshFailed(_) | Self::ValidationFailed(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
