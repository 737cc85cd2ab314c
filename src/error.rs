//! API error taxonomy and its mapping onto the failure envelope.
//!
//! ERROR HANDLING
//! ==============
//! Two tiers. Validation and auth failures are user-facing: their messages go
//! to the client verbatim. Unexpected failures are logged with full detail and
//! reach the client as a generic 500; in development the
//! [`expose_error_detail`] response mapper swaps the detail back in.

use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use common::{Envelope, err_types};
use serde::Serialize;

use crate::services::user::UserError;

pub const GENERIC_SERVER_ERROR: &str = "Internal server error";
pub const NOT_FOUND_MESSAGE: &str = "Not Found";
pub const LOGIN_REQUIRED: &str = "You need to sign in first";
pub const INVALID_CREDENTIALS: &str = "Incorrect username, email address, or password";
pub const INVALID_ACTIVATION_KEY: &str = "That activation key is not valid";
pub const INCORRECT_PASSWORD: &str = "Your current password is incorrect";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Failure envelope as sent in production.
    #[must_use]
    pub fn envelope(&self) -> Envelope {
        let (messages, err_type) = match self {
            Self::Validation(messages) => (messages.clone(), err_types::VALIDATION),
            Self::Unauthorized(message) => (vec![message.clone()], err_types::AUTH),
            Self::NotFound => (vec![NOT_FOUND_MESSAGE.to_owned()], err_types::NOT_FOUND),
            Self::Unexpected(_) => (vec![GENERIC_SERVER_ERROR.to_owned()], err_types::SERVER),
        };
        Envelope::failure(messages, vec![err_type.to_owned()])
    }
}

/// Detail of an unexpected error, attached to the 500 response for the
/// development-only [`expose_error_detail`] mapper.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.envelope())).into_response();
        if let Self::Unexpected(detail) = self {
            tracing::error!(error = %detail, "500 error");
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}

/// Development-only response mapper: replace the generic 500 message with
/// the logged detail.
pub async fn expose_error_detail(response: Response) -> Response {
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };
    let status = response.status();
    (status, Json(Envelope::failure(vec![detail], vec![err_types::SERVER.to_owned()]))).into_response()
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(v) => Self::Validation(v.messages),
            UserError::InvalidCredentials => Self::Unauthorized(INVALID_CREDENTIALS.to_owned()),
            UserError::InvalidActivationKey => Self::validation(INVALID_ACTIVATION_KEY),
            UserError::IncorrectPassword => Self::validation(INCORRECT_PASSWORD),
            UserError::NotFound => Self::NotFound,
            UserError::Hash(e) => Self::Unexpected(format!("password hashing failed: {e}")),
            UserError::Db(e) => Self::Unexpected(format!("database error: {e}")),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unexpected(format!("database error: {err}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejection is a failure envelope instead of
/// Axum's plain-text body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Wrap `data` in a success envelope.
///
/// # Errors
///
/// Returns [`ApiError::Unexpected`] if `data` cannot be serialized.
pub fn envelope_ok<T: Serialize>(data: T) -> Result<Json<Envelope>, ApiError> {
    let value = serde_json::to_value(data).map_err(|e| ApiError::Unexpected(format!("serialize response: {e}")))?;
    Ok(Json(Envelope::success(value)))
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
