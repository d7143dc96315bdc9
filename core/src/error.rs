//! Error types for the REST client.
//!
//! # Design
//! Every failure status (>= 300, redirects included) raises the single
//! `CallFailed` variant, carrying the status, the buffered response and a
//! best-effort JSON parse of the error body. Encode/decode failures are a
//! separate class: they name the offending type and are never wrapped into
//! `CallFailed`. Transport-level failures (DNS, connection refused, TLS)
//! pass through as the underlying `reqwest` error, untranslated.

use reqwest::StatusCode;
use thiserror::Error;

use crate::response::WireResponse;

#[derive(Debug, Error)]
pub enum RestError {
    /// The server answered with a failure status. Redirects count as
    /// failures here: the client never follows them.
    #[error("{} ({}), Reason: {}", reason_phrase(.status), .status.as_u16(), reason_phrase(.status))]
    CallFailed {
        status: StatusCode,
        /// The buffered response, available for inspection.
        response: WireResponse,
        /// The error body parsed as JSON, absent when the body was empty or
        /// not parseable.
        content: Option<serde_json::Value>,
        /// The raw error body as text, empty when there was none.
        content_text: String,
    },

    /// The request body could not be encoded to the resolved format.
    #[error("could not serialize value of type {type_name}: {reason}")]
    Serialization {
        type_name: &'static str,
        reason: String,
    },

    /// The response body could not be decoded into the requested type.
    #[error("could not deserialize response body into {type_name}: {reason}")]
    Deserialization {
        type_name: &'static str,
        reason: String,
    },

    /// A transport-level failure, propagated unmodified.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl RestError {
    /// The response status, when this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RestError::CallFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn reason_phrase(status: &StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}
