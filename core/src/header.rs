//! Request header model.
//!
//! # Design
//! A header is a plain (key, value) pair compared field-wise. Three keys
//! (`Authorization`, `Content-Type` and `Date`) are semantically special and
//! get dedicated constructors so callers cannot misspell them. The request
//! builder pulls those keys out of the merged header list and handles them
//! out-of-band; everything else is sent as a literal header line.
//!
//! No value-syntax validation happens here. A malformed value surfaces as a
//! transport error when the header is applied to the outgoing request.

use chrono::{DateTime, TimeZone};

pub(crate) const AUTHORIZATION: &str = "Authorization";
pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const DATE: &str = "Date";

/// A single HTTP request header.
///
/// Created per call or registered once as a default via
/// [`RestClient::add_default_header`](crate::RestClient::add_default_header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestHeader {
    pub key: String,
    pub value: String,
}

impl RestHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// An `Authorization` header carrying a literal credential value,
    /// e.g. `"Bearer abc123"` or `"MySchema user:password"`.
    pub fn authorization(value: impl Into<String>) -> Self {
        Self::new(AUTHORIZATION, value)
    }

    /// A `Content-Type` header. The value drives request body encoding
    /// instead of being sent as a literal header line.
    pub fn content_type(media_type: impl Into<String>) -> Self {
        Self::new(CONTENT_TYPE, media_type)
    }

    /// A `Content-Type` header with an explicit charset parameter.
    pub fn content_type_with_charset(media_type: &str, charset: &str) -> Self {
        Self::new(CONTENT_TYPE, format!("{media_type}; charset={charset}"))
    }

    /// A `Date` header formatted as round-trip ISO-8601 with offset.
    pub fn date<Tz: TimeZone>(timestamp: DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self::new(DATE, timestamp.to_rfc3339())
    }
}
