//! `/api/user` routes: current user, login, registration, logout,
//! activation and password change. Every response is an envelope.

use axum::extract::State;
use axum::response::Json;
use axum_extra::extract::cookie::SignedCookieJar;
use common::Envelope;
use serde::Deserialize;
use tracing::info;

use super::auth::{AuthUser, MaybeAuthUser, removal_cookie, session_cookie};
use crate::error::{ApiError, ApiJson, envelope_ok};
use crate::services::session;
use crate::services::user::{self, NewUser, User};
use crate::state::AppState;

pub const PASSWORD_CHANGED: &str = "Your password has been changed";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ActivateRequest {
    pub key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `GET /api/user`: the signed-in user, or `null`.
pub async fn current_user(auth: MaybeAuthUser) -> Result<Json<Envelope>, ApiError> {
    envelope_ok(auth.user.as_ref().map(User::serialize))
}

/// `POST /api/user/logout`: drop the session row and clear the cookie.
/// Anonymous callers get the same success envelope.
pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    auth: MaybeAuthUser,
) -> Result<(SignedCookieJar, Json<Envelope>), ApiError> {
    if let Some(token) = &auth.token {
        session::delete_session(&state.pool, token).await?;
    }
    if let Some(user) = &auth.user {
        info!(user_id = user.id, "user signed out");
    }
    Ok((jar.add(removal_cookie(&state)), envelope_ok(())?))
}

/// `POST /api/user/login`: verify credentials and start a fresh session.
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    auth: MaybeAuthUser,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<(SignedCookieJar, Json<Envelope>), ApiError> {
    let user = user::authenticate(&state.pool, &body.login, &body.password).await?;
    let jar = start_session(&state, jar, auth.token.as_deref(), &user).await?;
    info!(user_id = user.id, "user signed in");
    Ok((jar, envelope_ok(user.serialize())?))
}

/// `POST /api/user/register`: create the user and sign them in.
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    auth: MaybeAuthUser,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(SignedCookieJar, Json<Envelope>), ApiError> {
    let user = user::create_user(&state.pool, body).await?;
    let jar = start_session(&state, jar, auth.token.as_deref(), &user).await?;
    info!(user_id = user.id, account_id = user.account_id, "user registered");
    Ok((jar, envelope_ok(user.serialize())?))
}

/// `POST /api/user/activate`: confirm the account with its activation key.
pub async fn activate(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<ActivateRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let user = user::activate(&state.pool, auth.user.id, &body.key).await?;
    info!(user_id = user.id, "user activated");
    envelope_ok(user.serialize())
}

/// `POST /api/user/password`: replace the password after checking the
/// current one.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Envelope>, ApiError> {
    user::change_password(&state.pool, auth.user.id, &body.current_password, &body.new_password).await?;
    info!(user_id = auth.user.id, "password changed");
    Ok(Json(Envelope::success_with_messages(
        serde_json::Value::Null,
        vec![PASSWORD_CHANGED.to_owned()],
    )))
}

/// Replace any previous session with a new one for `user`.
async fn start_session(
    state: &AppState,
    jar: SignedCookieJar,
    previous: Option<&str>,
    user: &User,
) -> Result<SignedCookieJar, ApiError> {
    if let Some(token) = previous {
        session::delete_session(&state.pool, token).await?;
    }
    let token = session::create_session(&state.pool, user.id, state.session_ttl).await?;
    Ok(jar.add(session_cookie(state, token)))
}
