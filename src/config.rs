//! Runtime configuration parsed from environment variables.
//!
//! `.env` files are loaded by the binary (via `dotenvy`) before
//! [`AppConfig::from_env`] runs; CLI flags override these values.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

use crate::error::AuthError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000/api";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DIST_DIR: &str = "dist";
const TOKEN_FILE_NAME: &str = ".learn-sphere/tokens.json";

/// Optional transport timeouts. `None` means the transport default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: Option<u64>,
    pub connect_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub token_file: PathBuf,
    pub timeouts: HttpTimeouts,
    pub port: u16,
    pub dist_dir: PathBuf,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `LEARN_SPHERE_API_URL`: backend base URL (default `http://127.0.0.1:4000/api`)
    /// - `LEARN_SPHERE_TOKEN_FILE`: token file (default `$HOME/.learn-sphere/tokens.json`)
    /// - `LEARN_SPHERE_REQUEST_TIMEOUT_SECS`, `LEARN_SPHERE_CONNECT_TIMEOUT_SECS`
    /// - `PORT`: listen port for `serve` (default 3000)
    /// - `DIST_DIR`: built frontend directory for `serve` (default `dist`)
    /// - `COOKIE_SECURE`: mark mirrored cookies `Secure`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when a numeric or boolean value is malformed.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when a numeric or boolean value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("LEARN_SPHERE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned();

        let token_file = lookup("LEARN_SPHERE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_token_file(lookup("HOME")));

        let timeouts = HttpTimeouts {
            request_secs: parse_opt(&lookup, "LEARN_SPHERE_REQUEST_TIMEOUT_SECS")?,
            connect_secs: parse_opt(&lookup, "LEARN_SPHERE_CONNECT_TIMEOUT_SECS")?,
        };

        let port = parse_opt(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let dist_dir = lookup("DIST_DIR").map_or_else(|| PathBuf::from(DEFAULT_DIST_DIR), PathBuf::from);

        let cookie_secure = match lookup("COOKIE_SECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| AuthError::Config(format!("invalid COOKIE_SECURE: {raw}")))?,
        };

        Ok(Self { api_url, token_file, timeouts, port, dist_dir, cookie_secure })
    }
}

fn default_token_file(home: Option<String>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(TOKEN_FILE_NAME),
        None => PathBuf::from(TOKEN_FILE_NAME),
    }
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AuthError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AuthError::Config(format!("invalid {key}: {raw}"))),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
