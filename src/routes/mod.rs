//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! `/api/user/*` answers with JSON envelopes, `/` and `/index` render the
//! page shell, and everything else is looked up in `PUBLIC_DIR`. Misses
//! under `/api` get a 404 envelope; other page loads get the shell with a
//! 404 status.

pub mod auth;
pub mod pages;
pub mod user;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::expose_error_detail;
use crate::state::AppState;

/// Largest accepted JSON body.
pub const JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Full application router.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let static_files = ServeDir::new(&config.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(pages::fallback.with_state(state.clone()));

    let mut router = Router::new()
        .route("/api/user", get(user::current_user))
        .route("/api/user/logout", post(user::logout))
        .route("/api/user/login", post(user::login))
        .route("/api/user/register", post(user::register))
        .route("/api/user/activate", post(user::activate))
        .route("/api/user/password", post(user::change_password))
        .route("/", get(pages::main_page))
        .route("/index", get(pages::main_page))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .with_state(state);

    if config.environment.is_development() {
        router = router.layer(map_response(expose_error_detail));
    }
    if config.request_log {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
