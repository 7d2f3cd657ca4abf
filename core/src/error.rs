//! Error types for the request dispatcher and pipeline runner.
//!
//! # Design
//! Every failure is returned to the immediate caller; nothing is retried or
//! logged-and-swallowed. `HttpStatus` carries the numeric code and reason
//! phrase so its display matches a plain status line (`400 Bad Request`).
//! Transport failures keep their own enum so callers can tell a deadline
//! apart from a refused connection.

use thiserror::Error;

/// Failures raised by a [`Transport`](crate::Transport) while executing a
/// request or reading its body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete before its deadline.
    #[error("request timed out")]
    Timeout,

    /// DNS, connect, TLS or protocol failure before a response arrived.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response arrived but its body could not be read in full.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The transport refused the request as built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors returned by [`Dispatcher`](crate::Dispatcher) calls and pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response arrived with a status outside `200..300`.
    #[error("{status} {reason}")]
    HttpStatus { status: u16, reason: String },

    /// The body was not JSON or did not fit the receptacle's shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The caller broke the calling contract (unknown method, empty URL).
    #[error("contract violation: {0}")]
    Contract(String),
}

impl ApiError {
    /// True when the underlying transport gave up because of the deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::Timeout))
    }

    /// The HTTP status code, if this error came from status validation.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
