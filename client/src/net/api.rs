//! REST helpers for the `/api/user` endpoints.
//!
//! ERROR HANDLING
//! ==============
//! Every endpoint answers with an envelope. A failure envelope surfaces as
//! [`ClientError::Response`] carrying the server's messages, whatever the
//! HTTP status; a body that is not an envelope is reported by status first,
//! then as a decode error.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use common::{Envelope, ResponseError, SerializedUser, process_response};
use serde::Serialize;
use serde::de::DeserializeOwned;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub const CURRENT_USER_PATH: &str = "/api/user";
pub const LOGOUT_PATH: &str = "/api/user/logout";
pub const LOGIN_PATH: &str = "/api/user/login";
pub const REGISTER_PATH: &str = "/api/user/register";
pub const ACTIVATE_PATH: &str = "/api/user/activate";
pub const PASSWORD_PATH: &str = "/api/user/password";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success status without an envelope body.
    #[error("unexpected response status {status}")]
    Status { status: u16 },

    /// The body was not a valid envelope.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The server answered with a failure envelope, or its data did not fit.
    #[error(transparent)]
    Response(#[from] ResponseError),
}

// =============================================================================
// USER API TRAIT
// =============================================================================

/// The calls the auth store depends on. Enables mocking in tests.
#[async_trait::async_trait]
pub trait UserApi: Send + Sync {
    /// `GET /api/user`: the signed-in user, or `None` for anonymous sessions.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or a failure envelope.
    async fn get_logged_in_user(&self) -> Result<Option<SerializedUser>, ClientError>;

    /// `POST /api/user/logout`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or a non-success status.
    async fn logout(&self) -> Result<(), ClientError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// [`UserApi`] over HTTP. Keeps a cookie store so the session cookie set by
/// login or registration rides along on later calls.
pub struct HttpUserApi {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ActivateBody<'a> {
    key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl HttpUserApi {
    /// Client for the server at `base_url`, e.g. `http://localhost:31987`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the TLS backend cannot be
    /// initialised.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|e| ClientError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ClientError::Request(e.to_string()))?;
        parse_envelope_body(status, &text)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    /// `POST /api/user/login` with an email address or username.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Response`] for bad credentials.
    pub async fn login(&self, login: &str, password: &str) -> Result<SerializedUser, ClientError> {
        self.post_json(LOGIN_PATH, &LoginBody { login, password }).await
    }

    /// `POST /api/user/register`; the new user is signed in on success.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Response`] with every validation message.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<SerializedUser, ClientError> {
        self.post_json(REGISTER_PATH, &RegisterBody { email, username, password }).await
    }

    /// `POST /api/user/activate`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Response`] for a wrong key or no session.
    pub async fn activate(&self, key: &str) -> Result<SerializedUser, ClientError> {
        self.post_json(ACTIVATE_PATH, &ActivateBody { key }).await
    }

    /// `POST /api/user/password`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Response`] when the current password is wrong.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<(), ClientError> {
        self.post_json(PASSWORD_PATH, &PasswordBody { current_password, new_password }).await
    }
}

#[async_trait::async_trait]
impl UserApi for HttpUserApi {
    async fn get_logged_in_user(&self) -> Result<Option<SerializedUser>, ClientError> {
        self.send(self.http.get(self.url(CURRENT_USER_PATH))).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url(LOGOUT_PATH))
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status: status.as_u16() });
        }
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Decode a response body into the envelope's `data`.
fn parse_envelope_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => Ok(process_response(envelope)?),
        Err(_) if !(200..300).contains(&status) => Err(ClientError::Status { status }),
        Err(e) => Err(ClientError::Decode(e.to_string())),
    }
}
