//! Cookie presence pre-check and token cookie mirroring.
//!
//! SYSTEM CONTEXT
//! ==============
//! The served frontend mirrors its token pair into cookies through
//! `PUT /session/cookies` so this middleware can see them. The check is
//! presence-only and coarse: client-side guards remain the authority and
//! will still reject stale or under-privileged sessions after render.

use axum::extract::{Json, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::ShellState;
use crate::guard::{LOGIN_ROUTE, is_protected_path};
use crate::net::types::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Add both token cookies to `jar`.
#[must_use]
pub fn session_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone(), secure))
}

/// Add already-expired token cookies to `jar`, removing them client-side.
#[must_use]
pub fn expired_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    let expire = |name: &'static str| {
        let mut cookie = session_cookie(name, String::new(), secure);
        cookie.set_max_age(Duration::ZERO);
        cookie
    };
    jar.add(expire(ACCESS_COOKIE)).add(expire(REFRESH_COOKIE))
}

/// `true` when either token cookie is present and non-empty. Validity is
/// never checked here.
#[must_use]
pub fn has_session_cookie(jar: &CookieJar) -> bool {
    [ACCESS_COOKIE, REFRESH_COOKIE]
        .iter()
        .any(|name| jar.get(name).is_some_and(|c| !c.value().is_empty()))
}

/// Redirect protected-prefix requests without token cookies to `/login`.
pub async fn session_precheck(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_protected_path(path) && !has_session_cookie(&jar) {
        tracing::debug!(%path, "no session cookie; redirecting to login");
        return Redirect::temporary(LOGIN_ROUTE).into_response();
    }
    next.run(request).await
}

/// `PUT /session/cookies` — mirror the client's token pair into cookies.
pub async fn put_session_cookies(
    State(state): State<ShellState>,
    jar: CookieJar,
    Json(pair): Json<TokenPair>,
) -> impl IntoResponse {
    (session_cookies(jar, &pair, state.cookie_secure), StatusCode::NO_CONTENT)
}

/// `DELETE /session/cookies` — drop mirrored cookies after logout.
pub async fn delete_session_cookies(State(state): State<ShellState>, jar: CookieJar) -> impl IntoResponse {
    (expired_session_cookies(jar, state.cookie_secure), StatusCode::NO_CONTENT)
}
