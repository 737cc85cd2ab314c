use super::*;
use axum::http::header::COOKIE;
use axum::http::{HeaderValue, Request, StatusCode};
use axum_extra::extract::cookie::Key;

use crate::state::{cookie_key, test_helpers};

fn signed_cookie_pair(key: &Key, token: &str) -> String {
    test_helpers::signed_cookie_pair(key, COOKIE_NAME, token)
}

fn parts_with_cookie(cookie: Option<&str>) -> Parts {
    let mut builder = Request::builder().uri("/api/user");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, HeaderValue::from_str(cookie).expect("header"));
    }
    builder.body(()).expect("request").into_parts().0
}

// =============================================================================
// Cookies
// =============================================================================

#[tokio::test]
async fn session_cookie_has_hardened_attributes() {
    let state = test_helpers::test_app_state();
    let cookie = session_cookie(&state, "tok".into());
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.secure(), Some(false));
    assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
}

#[tokio::test]
async fn removal_cookie_expires_immediately_on_same_path() {
    let state = test_helpers::test_app_state();
    let cookie = removal_cookie(&state);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

#[test]
fn signed_cookie_round_trips_under_same_key() {
    let key = cookie_key(test_helpers::TEST_SECRET);
    let pair = signed_cookie_pair(&key, "abc");
    let parts = parts_with_cookie(Some(&pair));
    let jar = SignedCookieJar::from_headers(&parts.headers, key);
    assert_eq!(session_token(&jar).as_deref(), Some("abc"));
}

#[test]
fn cookie_signed_with_another_secret_is_ignored() {
    let other = cookie_key("some-other-secret-some-other-secret!!");
    let pair = signed_cookie_pair(&other, "abc");
    let parts = parts_with_cookie(Some(&pair));
    let jar = SignedCookieJar::from_headers(&parts.headers, cookie_key(test_helpers::TEST_SECRET));
    assert_eq!(session_token(&jar), None);
}

#[test]
fn unsigned_cookie_is_ignored() {
    let parts = parts_with_cookie(Some("sid=abc"));
    let jar = SignedCookieJar::from_headers(&parts.headers, cookie_key(test_helpers::TEST_SECRET));
    assert_eq!(session_token(&jar), None);
}

// =============================================================================
// Extractors
// =============================================================================

#[tokio::test]
async fn no_cookie_is_anonymous() {
    let state = test_helpers::test_app_state();
    let mut parts = parts_with_cookie(None);
    let auth = MaybeAuthUser::from_request_parts(&mut parts, &state).await.expect("anonymous");
    assert!(auth.user.is_none());
    assert!(auth.token.is_none());
}

#[tokio::test]
async fn tampered_cookie_is_anonymous() {
    let state = test_helpers::test_app_state();
    let mut pair = signed_cookie_pair(&state.cookie_key, &"a".repeat(64));
    pair.push('0');
    let mut parts = parts_with_cookie(Some(&pair));
    let auth = MaybeAuthUser::from_request_parts(&mut parts, &state).await.expect("anonymous");
    assert!(auth.user.is_none());
    assert!(auth.token.is_none());
}

#[tokio::test]
async fn signed_but_malformed_token_is_anonymous_with_token() {
    let state = test_helpers::test_app_state();
    let pair = signed_cookie_pair(&state.cookie_key, "not-a-session-token");
    let mut parts = parts_with_cookie(Some(&pair));
    let auth = MaybeAuthUser::from_request_parts(&mut parts, &state).await.expect("anonymous");
    assert!(auth.user.is_none());
    assert_eq!(auth.token.as_deref(), Some("not-a-session-token"));
}

#[tokio::test]
async fn auth_user_rejects_anonymous_with_401() {
    let state = test_helpers::test_app_state();
    let mut parts = parts_with_cookie(None);
    let Err(err) = AuthUser::from_request_parts(&mut parts, &state).await else {
        panic!("anonymous request must be rejected");
    };
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}
