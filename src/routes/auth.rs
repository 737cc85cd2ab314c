//! Session cookie plumbing and the auth extractors.
//!
//! The cookie carries an opaque session token signed with the key derived
//! from `SESSION_SECRET`. A missing, tampered, expired or unknown session is
//! anonymous, never an error; only a failing session store is.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use time::Duration;

use crate::error::{ApiError, LOGIN_REQUIRED};
use crate::services::session;
use crate::services::user::User;
use crate::state::AppState;

pub const COOKIE_NAME: &str = "sid";

/// Session cookie carrying `token`, valid for the configured session TTL.
#[must_use]
pub fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = Duration::seconds(i64::try_from(state.session_ttl.as_secs()).unwrap_or(i64::MAX));
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .max_age(max_age)
        .build()
}

/// Expired, empty session cookie. Sent on logout whether or not the request
/// carried a valid cookie.
#[must_use]
pub fn removal_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Verified session token from the request cookies, if any.
#[must_use]
pub fn session_token(jar: &SignedCookieJar) -> Option<String> {
    jar.get(COOKIE_NAME).map(|c| c.value().to_owned())
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Session lookup that never rejects anonymous requests.
pub struct MaybeAuthUser {
    pub user: Option<User>,
    /// Verified token from the cookie, even when it no longer maps to a user.
    pub token: Option<String>,
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = SignedCookieJar::from_headers(&parts.headers, app_state.cookie_key.clone());
        let Some(token) = session_token(&jar) else {
            return Ok(Self { user: None, token: None });
        };

        let user = session::load_session_user(&app_state.pool, &token).await?;
        Ok(Self { user, token: Some(token) })
    }
}

/// Authenticated user. Rejects anonymous requests with a 401 failure envelope.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match MaybeAuthUser::from_request_parts(parts, state).await? {
            MaybeAuthUser { user: Some(user), token: Some(token) } => Ok(Self { user, token }),
            _ => Err(ApiError::Unauthorized(LOGIN_REQUIRED.to_owned())),
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
