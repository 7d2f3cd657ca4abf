//! Pluggable execution of built requests.
//!
//! # Design
//! The dispatcher never talks to the network directly. It hands an
//! `HttpRequest` to a `Transport` and gets an `HttpResponse` back, so tests
//! can swap in a recording fake and embedders can bring their own client.
//! `UreqTransport` is the default: a blocking ureq agent that returns
//! 4xx/5xx responses as data and leaves status interpretation to the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ureq::http::Response;
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a fully built request and returns its status, headers and body.
///
/// Implementations must honor `request.deadline`: a call still running when
/// the deadline passes has to fail with [`TransportError::Timeout`].
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<Tr: Transport + ?Sized> Transport for Arc<Tr> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<Tr: Transport + ?Sized> Transport for &Tr {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Default transport backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an agent configured elsewhere (proxy, TLS, user agent). Status
    /// handling is overridden per request, so non-2xx responses still come
    /// back as data whatever the agent's own setting.
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout_remaining();
        if timeout.is_zero() {
            return Err(TransportError::Timeout);
        }

        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(&request.url), request, timeout).call(),
            HttpMethod::Delete => prepare(self.agent.delete(&request.url), request, timeout).call(),
            HttpMethod::Post => send(prepare(self.agent.post(&request.url), request, timeout), request),
            HttpMethod::Put => send(prepare(self.agent.put(&request.url), request, timeout), request),
            HttpMethod::Patch => send(prepare(self.agent.patch(&request.url), request, timeout), request),
        };

        let mut response = result.map_err(connection_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(body_error)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn prepare<B>(
    mut builder: RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Duration,
) -> RequestBuilder<B> {
    // ureq derives content-length from the body it is given.
    for (name, value) in &request.headers {
        if !name.eq_ignore_ascii_case("content-length") {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder
        .config()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
}

fn send(
    builder: RequestBuilder<WithBody>,
    request: &HttpRequest,
) -> Result<Response<Body>, ureq::Error> {
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn connection_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::BadUri(msg) => TransportError::InvalidRequest(msg),
        other => TransportError::Connection(other.to_string()),
    }
}

fn body_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        other => TransportError::Body(other.to_string()),
    }
}
