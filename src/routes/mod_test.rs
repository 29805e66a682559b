use axum::body::Body;
use axum::http::{Request, header};
use tower::ServiceExt;

use super::*;
use crate::net::types::TokenPair;
use crate::routes::precheck::{ACCESS_COOKIE, REFRESH_COOKIE, expired_session_cookies, has_session_cookie, session_cookies};
use axum_extra::extract::cookie::{Cookie, CookieJar};

fn shell() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>learn sphere</html>").unwrap();
    let router = app(ShellState { dist_dir: dir.path().to_path_buf(), cookie_secure: false });
    (dir, router)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

// =============================================================================
// cookie helpers
// =============================================================================

#[test]
fn session_cookies_mirror_both_tokens() {
    let pair = TokenPair { access_token: "a1".into(), refresh_token: "r1".into() };
    let jar = session_cookies(CookieJar::new(), &pair, true);
    let access = jar.get(ACCESS_COOKIE).unwrap();
    assert_eq!(access.value(), "a1");
    assert_eq!(access.path(), Some("/"));
    assert_eq!(access.http_only(), Some(true));
    assert_eq!(access.secure(), Some(true));
    assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "r1");
}

#[test]
fn has_session_cookie_is_presence_only() {
    assert!(!has_session_cookie(&CookieJar::new()));
    assert!(has_session_cookie(&CookieJar::new().add(Cookie::new(REFRESH_COOKIE, "anything"))));
    assert!(!has_session_cookie(&CookieJar::new().add(Cookie::new(ACCESS_COOKIE, ""))));
}

#[test]
fn expired_cookies_have_zero_max_age() {
    let jar = expired_session_cookies(CookieJar::new(), false);
    let access = jar.get(ACCESS_COOKIE).unwrap();
    assert_eq!(access.max_age(), Some(time::Duration::ZERO));
    assert!(!has_session_cookie(&jar));
}

// =============================================================================
// middleware
// =============================================================================

#[tokio::test]
async fn protected_prefix_without_cookie_redirects_to_login() {
    for uri in ["/admin", "/dashboard/courses", "/educator/new", "/courses/access/12"] {
        let (_dir, router) = shell();
        let resp = router.oneshot(get(uri, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
        assert_eq!(resp.headers()[header::LOCATION], "/login", "{uri}");
    }
}

#[tokio::test]
async fn protected_prefix_with_any_cookie_passes() {
    let (_dir, router) = shell();
    let resp = router.oneshot(get("/dashboard", Some("accessToken=stale"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_path_without_cookie_serves_spa() {
    let (_dir, router) = shell();
    let resp = router.oneshot(get("/courses", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn lookalike_prefix_is_not_protected() {
    let (_dir, router) = shell();
    let resp = router.oneshot(get("/administrator", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn healthz_ok() {
    let (_dir, router) = shell();
    let resp = router.oneshot(get("/healthz", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// cookie sync endpoints
// =============================================================================

#[tokio::test]
async fn put_session_cookies_sets_both() {
    let (_dir, router) = shell();
    let req = Request::builder()
        .method("PUT")
        .uri("/session/cookies")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"accessToken":"a1","refreshToken":"r1"}"#))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let set: Vec<_> = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect();
    assert!(set.iter().any(|c| c.starts_with("accessToken=a1")));
    assert!(set.iter().any(|c| c.starts_with("refreshToken=r1")));
}

#[tokio::test]
async fn delete_session_cookies_expires_both() {
    let (_dir, router) = shell();
    let req = Request::builder()
        .method("DELETE")
        .uri("/session/cookies")
        .header(header::COOKIE, "accessToken=a1; refreshToken=r1")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let set: Vec<_> = resp.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(set.len(), 2);
    assert!(set.iter().all(|v| v.to_str().unwrap().contains("Max-Age=0")));
}
