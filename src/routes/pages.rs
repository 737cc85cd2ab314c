//! Server-rendered page shell and the fallback for unmatched requests.

use axum::http::{Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use client::state::auth::InitialAuthData;
use client::state::main::InitialData;
use client::views::page::render_document;
use client::views::routes::Route;

use super::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::services::user::User;

const API_PREFIX: &str = "/api/";

/// `GET /` and `GET /index`: first paint with the auth payload embedded.
/// Paths the client router does not know still get the home shell, with a
/// 404 status.
pub async fn main_page(auth: MaybeAuthUser, uri: Uri) -> Result<(StatusCode, Html<String>), ApiError> {
    let route = Route::resolve(uri.path());
    let data = InitialData { auth: InitialAuthData { user: auth.user.as_ref().map(User::serialize) } };
    let html = render_document(&data, route).map_err(|e| ApiError::Unexpected(format!("render page: {e}")))?;
    let status = if route.not_found { StatusCode::NOT_FOUND } else { StatusCode::OK };
    Ok((status, Html(html)))
}

/// Anything no route or static file matched. API paths and non-GET
/// requests get a 404 envelope; page loads get the shell.
pub async fn fallback(method: Method, auth: MaybeAuthUser, uri: Uri) -> Result<Response, ApiError> {
    if is_api_path(uri.path()) || !(method == Method::GET || method == Method::HEAD) {
        return Err(ApiError::NotFound);
    }
    Ok(main_page(auth, uri).await?.into_response())
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with(API_PREFIX)
}
