//! Types shared by the server and the client tier.
//!
//! This crate owns the JSON response envelope every API handler emits and
//! the public projection of a user record. Both tiers depend on it so the
//! wire shape is defined in exactly one place.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known values for the `errTypes` field of a failure envelope.
pub mod err_types {
    /// A user-facing validation failure; messages are safe to display.
    pub const VALIDATION: &str = "ValidationError";
    /// The request needs an authenticated session.
    pub const AUTH: &str = "AuthError";
    /// No route or resource matched.
    pub const NOT_FOUND: &str = "NotFound";
    /// Unexpected server-side failure.
    pub const SERVER: &str = "ServerError";
}

// =============================================================================
// USER
// =============================================================================

/// Public projection of a user record. Never carries the password hash or
/// activation key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub activated: bool,
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Response envelope shared by every API handler.
///
/// On the wire the variant is selected by the boolean `success` field:
/// success carries `data`, failure carries `errTypes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub enum Envelope {
    Success { messages: Vec<String>, data: Value },
    Failure { messages: Vec<String>, err_types: Vec<String> },
}

impl Envelope {
    /// Success envelope with no messages.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self::Success { messages: Vec::new(), data }
    }

    /// Success envelope carrying informational messages.
    #[must_use]
    pub fn success_with_messages(data: Value, messages: Vec<String>) -> Self {
        Self::Success { messages, data }
    }

    /// Failure envelope.
    #[must_use]
    pub fn failure(messages: Vec<String>, err_types: Vec<String>) -> Self {
        Self::Failure { messages, err_types }
    }
}

/// Error returned when a JSON object does not form a valid envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeShapeError {
    #[error("success envelope must not carry errTypes")]
    ErrTypesOnSuccess,
    #[error("failure envelope must not carry data")]
    DataOnFailure,
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    success: bool,
    #[serde(default)]
    messages: Vec<String>,
    // `Some(Value::Null)` serializes as `"data": null`; absent and null both
    // decode to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(rename = "errTypes", default, skip_serializing_if = "Option::is_none")]
    err_types: Option<Vec<String>>,
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeShapeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        if wire.success {
            if wire.err_types.is_some() {
                return Err(EnvelopeShapeError::ErrTypesOnSuccess);
            }
            Ok(Self::Success { messages: wire.messages, data: wire.data.unwrap_or(Value::Null) })
        } else {
            if wire.data.is_some() {
                return Err(EnvelopeShapeError::DataOnFailure);
            }
            Ok(Self::Failure { messages: wire.messages, err_types: wire.err_types.unwrap_or_default() })
        }
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Success { messages, data } => {
                Self { success: true, messages, data: Some(data), err_types: None }
            }
            Envelope::Failure { messages, err_types } => {
                Self { success: false, messages, data: None, err_types: Some(err_types) }
            }
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Error returned by [`process_response`].
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// The server answered with a failure envelope.
    #[error("{}", failure_message(.messages))]
    Failed { messages: Vec<String>, err_types: Vec<String> },
    /// The success payload did not match the expected type.
    #[error("unexpected response data: {0}")]
    Decode(#[from] serde_json::Error),
}

fn failure_message(messages: &[String]) -> String {
    if messages.is_empty() { "request failed".to_owned() } else { messages.join("; ") }
}

/// Unwrap an envelope: the `data` of a success, or a [`ResponseError::Failed`]
/// carrying the envelope's messages.
///
/// # Errors
///
/// Returns [`ResponseError::Failed`] for failure envelopes and
/// [`ResponseError::Decode`] when `data` does not deserialize into `T`.
pub fn process_response<T: DeserializeOwned>(envelope: Envelope) -> Result<T, ResponseError> {
    match envelope {
        Envelope::Success { data, .. } => Ok(serde_json::from_value(data)?),
        Envelope::Failure { messages, err_types } => Err(ResponseError::Failed { messages, err_types }),
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
