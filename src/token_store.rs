//! Token persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! The interceptor reads the access token before every request and writes a
//! fresh pair after refresh; the auth context writes at login and clears at
//! logout. Stores never inspect token contents.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuthError;
use crate::net::types::TokenPair;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Get/set/clear contract for the current token pair.
pub trait TokenStore: Send + Sync {
    fn get(&self, kind: TokenKind) -> Option<String>;

    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the pair cannot be persisted.
    fn set(&self, pair: &TokenPair) -> Result<(), AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if persisted tokens cannot be removed.
    fn clear(&self) -> Result<(), AuthError>;

    /// `true` when neither token is present.
    fn is_empty(&self) -> bool {
        self.get(TokenKind::Access).is_none() && self.get(TokenKind::Refresh).is_none()
    }
}

fn pick(pair: Option<&TokenPair>, kind: TokenKind) -> Option<String> {
    let pair = pair?;
    let token = match kind {
        TokenKind::Access => &pair.access_token,
        TokenKind::Refresh => &pair.refresh_token,
    };
    (!token.is_empty()).then(|| token.clone())
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pair(pair: TokenPair) -> Self {
        Self { pair: Mutex::new(Some(pair)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        let guard = self.pair.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pick(guard.as_ref(), kind)
    }

    fn set(&self, pair: &TokenPair) -> Result<(), AuthError> {
        let mut guard = self.pair.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self.pair.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file store; the pair survives process restarts.
///
/// The file is read once at open and cached. A missing file is an empty
/// store; an unreadable or corrupt file is treated the same and logged.
/// Writes replace the file atomically and leave it readable by the owner
/// only.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: Mutex<Option<TokenPair>>,
}

impl FileTokenStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = load_pair(&path);
        Self { path, cached: Mutex::new(cached) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

/// Replace the token file atomically. The temp file is created owner-only
/// (0600 on unix) in the target directory and renamed over `path`.
fn write_pair(path: &Path, pair: &TokenPair) -> Result<(), AuthError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(storage_err)?;
    serde_json::to_writer_pretty(&mut tmp, pair).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// Delete the token file. If it cannot be deleted, truncate it in place so
/// the next open still reads an empty store.
fn remove_pair(path: &Path) -> Result<(), AuthError> {
    let err = match std::fs::remove_file(path) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => e,
    };
    tracing::warn!(path = %path.display(), error = %err, "token file not removed; truncating");
    std::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map(drop)
        .map_err(|_| storage_err(err))
}

fn load_pair(path: &Path) -> Option<TokenPair> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "token file unreadable; starting empty");
            return None;
        }
    };
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<TokenPair>(&raw) {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "token file corrupt; starting empty");
            None
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        let guard = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pick(guard.as_ref(), kind)
    }

    fn set(&self, pair: &TokenPair) -> Result<(), AuthError> {
        write_pair(&self.path, pair)?;
        let mut guard = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let removed = remove_pair(&self.path);
        let mut guard = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = None;
        removed
    }
}
