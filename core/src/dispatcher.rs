//! One complete request/response cycle into a typed receptacle.
//!
//! # Design
//! `Dispatcher` holds the two settings every call reads: the [`Config`]
//! (deadline length) and the [`Transport`]. Both can be replaced at any time
//! and take effect from the next call on. A call runs four steps in order,
//! stopping at the first failure:
//!
//! 1. build the request, placing input in the query or a form body depending
//!    on the method, and fix its deadline;
//! 2. execute it through the transport;
//! 3. reject any status outside `200..300` without touching the receptacle;
//! 4. merge the JSON body onto the receptacle (see [`codec::decode_merge`]).

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::codec;
use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Placement};
use crate::params::Params;
use crate::pipeline::{self, Recipe};
use crate::transport::{Transport, UreqTransport};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone)]
pub struct Dispatcher {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            config: Config::default(),
            transport: Arc::new(transport),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Arc::new(transport);
    }

    /// Build the request `dispatch` would send, without sending it.
    ///
    /// The deadline is fixed here, from the timeout configured right now.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        input: Option<&Params>,
    ) -> Result<HttpRequest, ApiError> {
        if url.trim().is_empty() {
            return Err(ApiError::Contract("request URL is empty".to_string()));
        }

        let mut request = HttpRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
            deadline: Instant::now() + self.config.timeout,
        };

        if let Some(params) = input {
            let encoded = codec::encode_form(params);
            match method.placement() {
                Placement::Query => request.url = append_query(url, &encoded),
                Placement::Body => {
                    request.headers = vec![
                        ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
                        ("Content-Length".to_string(), encoded.len().to_string()),
                    ];
                    request.body = Some(encoded);
                }
            }
        }

        Ok(request)
    }

    /// Send one request and merge its JSON response onto `out`.
    ///
    /// `out` is only written after a 2xx response decodes successfully;
    /// transport and status failures return before it is read.
    pub fn dispatch<T>(
        &self,
        method: HttpMethod,
        url: &str,
        input: Option<&Params>,
        out: &mut T,
    ) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        let request = self.build_request(method, url, input)?;
        debug!(%method, url = %request.url, timeout = ?self.config.timeout, "dispatching request");

        let response = self.transport.execute(&request).map_err(|err| {
            debug!(%method, url = %request.url, error = %err, "transport failed");
            ApiError::from(err)
        })?;

        if !response.is_success() {
            debug!(%method, url = %request.url, status = response.status, "unexpected status");
            return Err(ApiError::HttpStatus {
                status: response.status,
                reason: response.reason,
            });
        }

        debug!(%method, status = response.status, bytes = response.body.len(), "decoding response");
        codec::decode_merge(&response.body, out)
    }

    pub fn get<T>(&self, url: &str, input: Option<&Params>, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.dispatch(HttpMethod::Get, url, input, out)
    }

    pub fn post<T>(&self, url: &str, input: Option<&Params>, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.dispatch(HttpMethod::Post, url, input, out)
    }

    pub fn put<T>(&self, url: &str, input: Option<&Params>, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.dispatch(HttpMethod::Put, url, input, out)
    }

    pub fn patch<T>(&self, url: &str, input: Option<&Params>, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.dispatch(HttpMethod::Patch, url, input, out)
    }

    /// DELETE carries its input in the query string, like GET.
    pub fn delete<T>(&self, url: &str, input: Option<&Params>, out: &mut T) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.dispatch(HttpMethod::Delete, url, input, out)
    }

    /// Run `recipes` in order against `out`, stopping at the first error.
    pub fn pipe<T>(&self, out: &mut T, recipes: &[Recipe<T>]) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        pipeline::run(self, out, recipes)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(UreqTransport::new())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Add encoded pairs to `url`, keeping its existing query and fragment.
fn append_query(url: &str, encoded: &str) -> String {
    if encoded.is_empty() {
        return url.to_string();
    }
    let (base, fragment) = match url.find('#') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{base}{separator}{encoded}{fragment}")
}
