//! The REST client facade and per-call transport dispatch.
//!
//! # Design
//! `RestClient` holds configuration only: base address, registered default
//! headers, optional transport overrides, the insecure-TLS flag and the
//! pre-send observers. Configuration is set up front and treated as
//! read-only during calls; every call is an independent round trip.
//!
//! Each verb exists as an async method and a `_blocking` twin with identical
//! semantics. Unless an override transport was supplied, a fresh `reqwest`
//! client is built per call, configured to never follow redirects and,
//! when the insecure flag is set, to accept any server certificate. The
//! reply is buffered into a [`WireResponse`] and handed to the requested
//! [`ResponseTarget`].

use std::fmt;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use reqwest::{redirect, Method};
use tracing::debug;
use url::Url;

use crate::error::RestError;
use crate::header::RestHeader;
use crate::request::{build_wire, RestBody, RestRequest, WireRequest};
use crate::response::{ResponseTarget, WireResponse};

type Observer = Box<dyn Fn(&WireRequest) + Send + Sync>;

/// Builder for a [`RestClient`].
#[derive(Default)]
pub struct RestClientBuilder {
    base_address: String,
    default_headers: Vec<RestHeader>,
    observers: Vec<Observer>,
    transport: Option<reqwest::Client>,
    blocking_transport: Option<reqwest::blocking::Client>,
    insecure: bool,
}

impl RestClientBuilder {
    fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            ..Self::default()
        }
    }

    /// Accept any server certificate on the default transport.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Register a header applied to every request, before per-call headers.
    pub fn default_header(mut self, header: RestHeader) -> Self {
        self.default_headers.push(header);
        self
    }

    /// Use a caller-supplied async transport instead of a per-call default.
    /// Redirect and TLS policy become the override's responsibility.
    pub fn transport(mut self, client: reqwest::Client) -> Self {
        self.transport = Some(client);
        self
    }

    /// Use a caller-supplied blocking transport instead of a per-call
    /// default.
    pub fn blocking_transport(mut self, client: reqwest::blocking::Client) -> Self {
        self.blocking_transport = Some(client);
        self
    }

    /// Register an observer invoked with the fully resolved request
    /// immediately before each send.
    pub fn on_sending_request<F>(mut self, observer: F) -> Self
    where
        F: Fn(&WireRequest) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn build(self) -> RestClient {
        RestClient {
            base_address: self.base_address,
            default_headers: self.default_headers,
            observers: self.observers,
            transport: self.transport,
            blocking_transport: self.blocking_transport,
            insecure: self.insecure,
        }
    }
}

/// A typed REST client: content negotiation on the way out, typed decoding
/// on the way back, and one structured error for every failure status.
///
/// The result shape of each call is chosen with a [`ResponseTarget`] type
/// parameter, e.g. `Typed<Model>`, `Text`, `Binary`, `Dynamic`, `Raw`,
/// `Deferred` or `Discard` for fire-and-forget.
pub struct RestClient {
    base_address: String,
    default_headers: Vec<RestHeader>,
    observers: Vec<Observer>,
    transport: Option<reqwest::Client>,
    blocking_transport: Option<reqwest::blocking::Client>,
    insecure: bool,
}

impl RestClient {
    /// A client resolving relative addresses against `base_address`. Pass an
    /// empty string to require absolute addresses per call.
    pub fn new(base_address: impl Into<String>) -> Self {
        Self::builder(base_address).build()
    }

    pub fn builder(base_address: impl Into<String>) -> RestClientBuilder {
        RestClientBuilder::new(base_address)
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Append a header applied to every subsequent request. No dedup, no
    /// removal; a per-call `Content-Type`/`Authorization`/`Date` still
    /// overrides the registered one.
    pub fn add_default_header(&mut self, header: RestHeader) {
        self.default_headers.push(header);
    }

    /// Register a pre-send observer. Observers run synchronously in
    /// registration order with the fully resolved request.
    pub fn on_sending_request<F>(&mut self, observer: F)
    where
        F: Fn(&WireRequest) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    //-- GET ----------------------------------------------------------------

    pub async fn get<F: ResponseTarget>(
        &self,
        address: &str,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute::<F>(request(Method::GET, address, None, headers)).await
    }

    pub fn get_blocking<F: ResponseTarget>(
        &self,
        address: &str,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute_blocking::<F>(request(Method::GET, address, None, headers))
    }

    //-- POST ---------------------------------------------------------------

    pub async fn post<F: ResponseTarget>(
        &self,
        address: &str,
        body: Option<RestBody>,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute::<F>(request(Method::POST, address, body, headers)).await
    }

    pub fn post_blocking<F: ResponseTarget>(
        &self,
        address: &str,
        body: Option<RestBody>,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute_blocking::<F>(request(Method::POST, address, body, headers))
    }

    //-- PUT ----------------------------------------------------------------

    pub async fn put<F: ResponseTarget>(
        &self,
        address: &str,
        body: Option<RestBody>,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute::<F>(request(Method::PUT, address, body, headers)).await
    }

    pub fn put_blocking<F: ResponseTarget>(
        &self,
        address: &str,
        body: Option<RestBody>,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute_blocking::<F>(request(Method::PUT, address, body, headers))
    }

    //-- DELETE -------------------------------------------------------------

    pub async fn delete<F: ResponseTarget>(
        &self,
        address: &str,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute::<F>(request(Method::DELETE, address, None, headers)).await
    }

    pub fn delete_blocking<F: ResponseTarget>(
        &self,
        address: &str,
        headers: &[RestHeader],
    ) -> Result<F::Output, RestError> {
        self.execute_blocking::<F>(request(Method::DELETE, address, None, headers))
    }

    //-- SEND ---------------------------------------------------------------

    /// Execute a fully custom pre-built request.
    pub async fn send<F: ResponseTarget>(
        &self,
        request: RestRequest,
    ) -> Result<F::Output, RestError> {
        self.execute::<F>(request).await
    }

    /// Blocking twin of [`send`](Self::send).
    pub fn send_blocking<F: ResponseTarget>(
        &self,
        request: RestRequest,
    ) -> Result<F::Output, RestError> {
        self.execute_blocking::<F>(request)
    }

    //-- internals ----------------------------------------------------------

    async fn execute<F: ResponseTarget>(
        &self,
        request: RestRequest,
    ) -> Result<F::Output, RestError> {
        let wire = self.prepare(request)?;
        let envelope = self.dispatch(&wire).await?;
        F::process(&envelope)
    }

    fn execute_blocking<F: ResponseTarget>(
        &self,
        request: RestRequest,
    ) -> Result<F::Output, RestError> {
        let wire = self.prepare(request)?;
        let envelope = self.dispatch_blocking(&wire)?;
        F::process(&envelope)
    }

    /// Build the wire request, resolve its URL against the base address and
    /// notify observers. If an observer panics the call aborts before
    /// dispatch.
    fn prepare(&self, request: RestRequest) -> Result<WireRequest, RestError> {
        let RestRequest {
            method,
            address,
            body,
            headers,
        } = request;

        let mut wire = build_wire(method, address, body, &self.default_headers, &headers)?;
        wire.url = resolve_address(&self.base_address, &wire.url);

        debug!(method = %wire.method, url = %wire.url, "sending request");
        for observer in &self.observers {
            observer(&wire);
        }
        Ok(wire)
    }

    async fn dispatch(&self, wire: &WireRequest) -> Result<WireResponse, RestError> {
        let client = match &self.transport {
            Some(client) => client.clone(),
            None => self.default_transport()?,
        };

        let mut request = client.request(wire.method.clone(), wire.url.as_str());
        if let Some(auth) = &wire.authorization {
            request = request.header(AUTHORIZATION, auth.as_str());
        }
        if let Some(date) = &wire.date {
            request = request.header(DATE, date.as_str());
        }
        for (key, value) in &wire.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &wire.body {
            if let Some(content_type) = &body.content_type {
                request = request.header(CONTENT_TYPE, content_type.as_str());
            }
            request = request.body(body.bytes.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }

    fn dispatch_blocking(&self, wire: &WireRequest) -> Result<WireResponse, RestError> {
        let client = match &self.blocking_transport {
            Some(client) => client.clone(),
            None => self.default_blocking_transport()?,
        };

        let mut request = client.request(wire.method.clone(), wire.url.as_str());
        if let Some(auth) = &wire.authorization {
            request = request.header(AUTHORIZATION, auth.as_str());
        }
        if let Some(date) = &wire.date {
            request = request.header(DATE, date.as_str());
        }
        for (key, value) in &wire.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &wire.body {
            if let Some(content_type) = &body.content_type {
                request = request.header(CONTENT_TYPE, content_type.as_str());
            }
            request = request.body(body.bytes.clone());
        }

        let response = request.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;
        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }

    fn default_transport(&self) -> Result<reqwest::Client, RestError> {
        let mut builder = reqwest::Client::builder().redirect(redirect::Policy::none());
        if self.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(builder.build()?)
    }

    fn default_blocking_transport(&self) -> Result<reqwest::blocking::Client, RestError> {
        let mut builder = reqwest::blocking::Client::builder().redirect(redirect::Policy::none());
        if self.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(builder.build()?)
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_address", &self.base_address)
            .field("default_headers", &self.default_headers)
            .field("observers", &self.observers.len())
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}

fn request(method: Method, address: &str, body: Option<RestBody>, headers: &[RestHeader]) -> RestRequest {
    RestRequest {
        method,
        address: address.to_string(),
        body,
        headers: headers.to_vec(),
    }
}

/// Resolve an address against the configured base. An address that is
/// already absolute is used unchanged. Otherwise the base's trailing slash
/// is normalized to exactly one and at most one leading slash is stripped
/// from the relative part.
fn resolve_address(base: &str, address: &str) -> String {
    if base.is_empty() || Url::parse(address).is_ok() {
        return address.to_string();
    }

    let base = base.trim_end_matches('/');
    let relative = address.strip_prefix('/').unwrap_or(address);
    if relative.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{relative}")
    }
}
