//! Router for serving the built frontend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Static assets and the SPA entry point are served from `dist_dir`. Every
//! request passes the cookie pre-check first; unknown paths fall back to
//! `index.html` so client-side routing (and the authoritative guards) take
//! over.

pub mod precheck;

use std::path::{Path, PathBuf};

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, put};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct ShellState {
    pub dist_dir: PathBuf,
    pub cookie_secure: bool,
}

/// Assemble the frontend router.
pub fn app(state: ShellState) -> Router {
    let spa = spa_service(&state.dist_dir);

    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/session/cookies",
            put(precheck::put_session_cookies).delete(precheck::delete_session_cookies),
        )
        .fallback_service(spa)
        .layer(middleware::from_fn(precheck::session_precheck))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn spa_service(dist_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dist_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(dist_dir.join("index.html")))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
