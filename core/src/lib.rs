//! Typed REST client with content negotiation and uniform error translation.
//!
//! # Overview
//! A convenience layer over `reqwest`: requests are built from an address,
//! an optional body and a header list; bodies are encoded to JSON, XML,
//! plain text or raw bytes based on the effective `Content-Type`; responses
//! are decoded into the result shape the caller asks for; and every failure
//! status raises one structured error carrying the parsed error body when
//! available.
//!
//! # Design
//! - `RestClient` holds configuration only: base address, default headers,
//!   optional transport overrides, pre-send observers. Every call is an
//!   independent, stateless round trip on its own transport handle.
//! - The result shape is a type parameter implementing [`ResponseTarget`]:
//!   `Typed<T>` for structured decoding by declared content type, `Text`,
//!   `Binary`, `Dynamic` for schema-less access, `Discard` for
//!   fire-and-forget, and the `Raw` / `Deferred` escape hatches.
//! - Each verb has an async method and a `_blocking` twin with identical
//!   semantics.
//!
//! ```no_run
//! use rest_client::{RestClient, Typed};
//!
//! #[derive(serde::Deserialize)]
//! struct Model { id: i32 }
//!
//! # fn main() -> Result<(), rest_client::RestError> {
//! let client = RestClient::new("http://localhost:5000/api");
//! let model = client.get_blocking::<Typed<Model>>("test/1", &[])?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod header;
pub mod request;
pub mod response;

pub use client::{RestClient, RestClientBuilder};
pub use error::RestError;
pub use header::RestHeader;
pub use request::{EncodedBody, RestBody, RestRequest, WireRequest};
pub use response::{
    Binary, Deferred, Discard, Dynamic, Raw, ResponseTarget, RestResponse, Text, Typed,
    WireResponse,
};

pub use reqwest::Method;
