//! Response envelopes and the typed decode pipeline.
//!
//! # Design
//! Each call buffers the reply into a [`WireResponse`]: status, headers and
//! body bytes, read exactly once. What happens next depends on the result
//! shape the caller asked for, expressed as a type implementing
//! [`ResponseTarget`]:
//!
//! - [`Raw`] hands back the envelope untouched, whatever the status. This is
//!   the one shape that bypasses error translation; callers inspect the
//!   status themselves.
//! - [`Deferred`] wraps the envelope in a [`RestResponse`], exposing status
//!   and headers immediately and re-runnable typed decoding on demand.
//! - Every other shape first translates a failure status (>= 300) into
//!   [`RestError::CallFailed`], then yields its empty value on 204, then
//!   decodes: [`Binary`] and [`Text`] return the body as-is, while
//!   [`Typed`] and [`Dynamic`] pick JSON or XML from the response's declared
//!   media type. An absent or unrecognized media type silently yields the
//!   empty value; that is a recoverable case, not an error.

use std::marker::PhantomData;

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::RestError;
use crate::request::split_content_type;

/// A buffered HTTP response: status, headers and the full body.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WireResponse {
    /// True when the status is below 300. Redirects are failures by design.
    pub fn is_success(&self) -> bool {
        self.status.as_u16() < 300
    }

    /// The declared media type, lowercased, without parameters. `None` when
    /// the header is missing, unreadable or empty.
    pub fn media_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let (media, _) = split_content_type(value);
        if media.is_empty() {
            None
        } else {
            Some(media.to_ascii_lowercase())
        }
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One result shape a caller may request: the compile-time dispatch table
/// deciding how a buffered response becomes a value.
pub trait ResponseTarget {
    type Output;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError>;
}

/// Escape hatch: the untouched [`WireResponse`], never an error.
pub struct Raw;

impl ResponseTarget for Raw {
    type Output = WireResponse;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        Ok(envelope.clone())
    }
}

/// Escape hatch: a [`RestResponse`] wrapper with deferred, repeatable decode.
pub struct Deferred;

impl ResponseTarget for Deferred {
    type Output = RestResponse;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        Ok(RestResponse {
            envelope: envelope.clone(),
        })
    }
}

/// Fire-and-forget: failure statuses still raise, but the body of a
/// successful reply is never decoded.
pub struct Discard;

impl ResponseTarget for Discard {
    type Output = ();

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        ensure_success(envelope)
    }
}

/// The full body as raw bytes.
pub struct Binary;

impl ResponseTarget for Binary {
    type Output = Vec<u8>;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        ensure_success(envelope)?;
        if envelope.status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        Ok(envelope.body.to_vec())
    }
}

/// The full body decoded as UTF-8 text.
pub struct Text;

impl ResponseTarget for Text {
    type Output = String;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        ensure_success(envelope)?;
        if envelope.status == StatusCode::NO_CONTENT {
            return Ok(String::new());
        }
        String::from_utf8(envelope.body.to_vec()).map_err(|e| RestError::Deserialization {
            type_name: std::any::type_name::<String>(),
            reason: e.to_string(),
        })
    }
}

/// An open/dynamic object: the body as a [`serde_json::Value`], decoded by
/// the declared media type, with no predeclared schema. Yields
/// `Value::Null` when there is nothing to decode.
pub struct Dynamic;

impl ResponseTarget for Dynamic {
    type Output = serde_json::Value;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        ensure_success(envelope)?;
        if envelope.status == StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }
        Ok(decode_structured(envelope)?.unwrap_or(serde_json::Value::Null))
    }
}

/// A concrete structured type, decoded as JSON or XML depending on the
/// response's declared media type. `None` when the reply carries no
/// decodable content (204, missing or unrecognized media type).
pub struct Typed<T>(PhantomData<T>);

impl<T: DeserializeOwned> ResponseTarget for Typed<T> {
    type Output = Option<T>;

    fn process(envelope: &WireResponse) -> Result<Self::Output, RestError> {
        ensure_success(envelope)?;
        if envelope.status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode_structured(envelope)
    }
}

/// The deferred-decode wrapper produced by [`Deferred`]: status and headers
/// up front, typed content on demand. Decoding runs against the buffered
/// body and may be repeated with different targets.
#[derive(Debug, Clone)]
pub struct RestResponse {
    envelope: WireResponse,
}

impl RestResponse {
    pub fn status(&self) -> StatusCode {
        self.envelope.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.envelope.headers
    }

    pub fn is_success(&self) -> bool {
        self.envelope.is_success()
    }

    /// Decode the buffered body as `F`, with the same semantics as an
    /// immediate decode, including raising on a failure status.
    pub fn content<F: ResponseTarget>(&self) -> Result<F::Output, RestError> {
        F::process(&self.envelope)
    }

    pub fn into_wire(self) -> WireResponse {
        self.envelope
    }
}

/// Translate a failure status into [`RestError::CallFailed`], reading the
/// body as text and attempting a JSON parse of it. A parse failure is not
/// an error: the structured content is simply absent.
fn ensure_success(envelope: &WireResponse) -> Result<(), RestError> {
    if envelope.is_success() {
        return Ok(());
    }

    let content_text = envelope.text();
    let content = if content_text.is_empty() {
        None
    } else {
        serde_json::from_str(&content_text).ok()
    };

    warn!(status = envelope.status.as_u16(), "call failed");
    Err(RestError::CallFailed {
        status: envelope.status,
        response: envelope.clone(),
        content,
        content_text,
    })
}

fn decode_structured<T: DeserializeOwned>(
    envelope: &WireResponse,
) -> Result<Option<T>, RestError> {
    let Some(media) = envelope.media_type() else {
        return Ok(None);
    };

    if media.contains("json") {
        serde_json::from_slice(&envelope.body)
            .map(Some)
            .map_err(|e| RestError::Deserialization {
                type_name: std::any::type_name::<T>(),
                reason: e.to_string(),
            })
    } else if media.contains("xml") {
        let text = std::str::from_utf8(&envelope.body).map_err(|e| RestError::Deserialization {
            type_name: std::any::type_name::<T>(),
            reason: e.to_string(),
        })?;
        quick_xml::de::from_str(text)
            .map(Some)
            .map_err(|e| RestError::Deserialization {
                type_name: std::any::type_name::<T>(),
                reason: e.to_string(),
            })
    } else {
        Ok(None)
    }
}
