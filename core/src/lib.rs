//! Typed HTTP request helper with sequential request pipelines.
//!
//! # Overview
//! [`Dispatcher`] performs one request/response cycle: it places input
//! parameters in the query string (GET, DELETE) or a form body (POST, PUT,
//! PATCH), binds the request to a deadline, executes it through a pluggable
//! [`Transport`], rejects non-2xx statuses and merges the JSON response onto
//! a caller-owned receptacle. Fields the response does not mention keep
//! their previous values.
//!
//! [`Pipeline`] and [`pipeline::run`] chain [`Recipe`]s over one shared
//! receptacle, so each stage can read what earlier stages wrote. The first
//! failing stage stops the chain and its error is returned unchanged.
//!
//! # Design
//! - Requests and responses are plain data ([`HttpRequest`],
//!   [`HttpResponse`]); the transport is the only part that does I/O.
//! - Settings live on the `Dispatcher` instance, not in globals.
//! - Decoding is atomic: a failed decode leaves the receptacle untouched.

pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod params;
pub mod pipeline;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::{Config, DEFAULT_TIMEOUT_SECS};
pub use dispatcher::Dispatcher;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Placement};
pub use params::Params;
pub use pipeline::{Pipeline, Recipe, RequestSpec};
pub use transport::{Transport, UreqTransport};
