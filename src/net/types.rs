//! Wire DTOs exchanged with the Learn Sphere REST API.
//!
//! DESIGN
//! ======
//! Field names follow the backend's camelCase JSON. Tokens are opaque
//! strings; nothing here parses or checks their contents.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Access + refresh token issued at login and replaced at refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Snapshot of the authenticated user returned by session validation.
///
/// Replaced wholesale on every validation, never patched in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_educator: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub role: String,
}

/// Email + password submitted by the login form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Trim and validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInput`] with a user-facing message when a
    /// field is blank.
    pub fn parse(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidInput("Enter your email."));
        }
        if password.trim().is_empty() {
            return Err(AuthError::InvalidInput("Enter your password."));
        }
        Ok(Self { email: email.to_owned(), password: password.to_owned() })
    }
}

/// `POST /auth/login` response. Some deployments include the user profile.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<UserSession>,
}

impl LoginResponse {
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        TokenPair { access_token: self.access_token.clone(), refresh_token: self.refresh_token.clone() }
    }
}

/// `POST /auth/refresh` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `GET /auth/validate` body: either the bare user or `{ "user": … }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ValidateResponse {
    Wrapped { user: UserSession },
    Bare(UserSession),
}

impl ValidateResponse {
    pub(crate) fn into_user(self) -> UserSession {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

/// Error body shape used by the backend (`{ "message": … }`).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
