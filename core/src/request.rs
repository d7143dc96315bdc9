//! Request descriptors and the wire-request builder.
//!
//! # Design
//! A [`RestRequest`] is the caller-facing description of one call: method,
//! address, optional body, per-call headers. [`build_wire`] merges it with
//! the client's default headers and produces a [`WireRequest`], the fully
//! encoded, transport-ready form. The split keeps encoding deterministic and
//! testable without any network I/O.
//!
//! Body encoding is driven by the effective `Content-Type`: an explicit
//! per-call header wins over a registered default, which wins over inference
//! from the body shape. Byte bodies pass through verbatim, text bodies are
//! sent as UTF-8 `text/plain`, and everything else is serialized to pretty
//! JSON, unless the resolved media type names XML, in which case the value
//! is serialized as an XML document instead. A structured body under an
//! unrelated custom media type still gets JSON bytes; the media type is kept
//! verbatim on the wire.

use reqwest::Method;
use serde::Serialize;

use crate::error::RestError;
use crate::header::{self, RestHeader};

/// A request body prior to encoding.
///
/// Byte and string types convert via `From`; structured values are captured
/// with [`RestBody::serialize`], which also records the value's type name for
/// error messages and the XML root element.
#[derive(Debug, Clone)]
pub enum RestBody {
    Bytes(Vec<u8>),
    Text(String),
    Value {
        value: serde_json::Value,
        type_name: &'static str,
    },
}

impl RestBody {
    /// Captures any serializable value as a structured body. The wire format
    /// (JSON or XML) is decided later, when the effective content type is
    /// known.
    pub fn serialize<T: Serialize>(value: &T) -> Result<Self, RestError> {
        let type_name = std::any::type_name::<T>();
        let value = serde_json::to_value(value).map_err(|e| RestError::Serialization {
            type_name,
            reason: e.to_string(),
        })?;
        Ok(RestBody::Value { value, type_name })
    }
}

impl From<Vec<u8>> for RestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RestBody::Bytes(bytes)
    }
}

impl From<&[u8]> for RestBody {
    fn from(bytes: &[u8]) -> Self {
        RestBody::Bytes(bytes.to_vec())
    }
}

impl From<String> for RestBody {
    fn from(text: String) -> Self {
        RestBody::Text(text)
    }
}

impl From<&str> for RestBody {
    fn from(text: &str) -> Self {
        RestBody::Text(text.to_string())
    }
}

/// A caller-built request, consumed by [`RestClient::send`](crate::RestClient::send)
/// and its blocking twin.
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    pub address: String,
    pub body: Option<RestBody>,
    pub headers: Vec<RestHeader>,
}

impl RestRequest {
    pub fn new(method: Method, address: impl Into<String>) -> Self {
        Self {
            method,
            address: address.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn body(mut self, body: impl Into<RestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, header: RestHeader) -> Self {
        self.headers.push(header);
        self
    }
}

/// An encoded request body with its resolved content type.
#[derive(Debug, Clone)]
pub struct EncodedBody {
    pub bytes: Vec<u8>,
    /// Unset only for byte bodies sent without any resolved content type.
    pub content_type: Option<String>,
}

/// The transport-ready form of a request: absolute-or-relative URL, literal
/// header lines, out-of-band `Authorization`/`Date` values, and the encoded
/// body. Pre-send observers receive this after URL resolution.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub date: Option<String>,
    pub body: Option<EncodedBody>,
}

/// Merge default and per-call headers and encode the body.
///
/// Defaults apply first, per-call headers after, in order. `Content-Type`,
/// `Authorization` and `Date` are extracted rather than emitted as literal
/// lines; for each, a later occurrence overrides an earlier one, so a
/// per-call header beats a registered default. All other headers pass
/// through untouched, duplicates included.
pub(crate) fn build_wire(
    method: Method,
    address: String,
    body: Option<RestBody>,
    defaults: &[RestHeader],
    per_call: &[RestHeader],
) -> Result<WireRequest, RestError> {
    let mut content_type: Option<String> = None;
    let mut authorization: Option<String> = None;
    let mut date: Option<String> = None;
    let mut lines = Vec::new();

    for h in defaults.iter().chain(per_call) {
        match h.key.as_str() {
            header::CONTENT_TYPE => content_type = Some(h.value.clone()),
            header::AUTHORIZATION => authorization = Some(h.value.clone()),
            header::DATE => date = Some(h.value.clone()),
            _ => lines.push((h.key.clone(), h.value.clone())),
        }
    }

    let body = match body {
        Some(b) => Some(encode_body(b, content_type.as_deref())?),
        None => None,
    };

    Ok(WireRequest {
        method,
        url: address,
        headers: lines,
        authorization,
        date,
        body,
    })
}

fn encode_body(body: RestBody, resolved: Option<&str>) -> Result<EncodedBody, RestError> {
    match body {
        RestBody::Bytes(bytes) => Ok(EncodedBody {
            bytes,
            content_type: resolved.map(str::to_string),
        }),
        RestBody::Text(text) => Ok(EncodedBody {
            bytes: text.into_bytes(),
            content_type: Some(resolved.unwrap_or("text/plain").to_string()),
        }),
        RestBody::Value { value, type_name } => {
            let (media, charset) = match resolved {
                Some(ct) => split_content_type(ct),
                None => (String::new(), None),
            };
            let charset = charset.unwrap_or_else(|| "utf-8".to_string());

            if media.to_ascii_lowercase().contains("xml") {
                let document = value_to_xml(xml_root_name(type_name), &value);
                return Ok(EncodedBody {
                    bytes: document.into_bytes(),
                    content_type: Some(format!("{media}; charset={charset}")),
                });
            }

            let media = if media.is_empty() {
                "application/json"
            } else {
                &media
            };
            let document =
                serde_json::to_string_pretty(&value).map_err(|e| RestError::Serialization {
                    type_name,
                    reason: e.to_string(),
                })?;
            Ok(EncodedBody {
                bytes: document.into_bytes(),
                content_type: Some(format!("{media}; charset={charset}")),
            })
        }
    }
}

/// Split a `Content-Type` value into its media type and optional charset
/// parameter. Other parameters are dropped.
pub(crate) fn split_content_type(value: &str) -> (String, Option<String>) {
    let mut parts = value.split(';');
    let media = parts.next().unwrap_or("").trim().to_string();
    let charset = parts
        .find_map(|p| p.trim().strip_prefix("charset="))
        .map(|cs| cs.trim().to_string());
    (media, charset)
}

/// Root element name for XML documents: the bare type name, without module
/// path or generic arguments.
fn xml_root_name(type_name: &'static str) -> &'static str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

/// Render a captured value as an XML document: object keys become child
/// elements, arrays repeat their element, scalars become text content.
fn value_to_xml(root: &str, value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_element(&mut out, root, value);
    out
}

fn write_element(out: &mut String, name: &str, value: &serde_json::Value) {
    use serde_json::Value;
    match value {
        // A sequence repeats the enclosing element, one per item.
        Value::Array(items) => {
            for item in items {
                write_element(out, name, item);
            }
        }
        Value::Object(fields) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for (key, field) in fields {
                write_element(out, key, field);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Value::Null => {
            out.push('<');
            out.push_str(name);
            out.push_str("/>");
        }
        Value::String(text) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            out.push_str(&xml_escape(text));
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        scalar => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            out.push_str(&scalar.to_string());
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
