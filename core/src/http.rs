//! HTTP requests and responses described as plain data.
//!
//! # Design
//! The dispatcher builds an `HttpRequest` value before anything touches the
//! network, and the [`Transport`](crate::Transport) hands back an
//! `HttpResponse` value. Keeping both sides as data lets tests inspect the
//! exact request that would be sent and feed canned responses back in.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::ApiError;

/// HTTP method for a request. The set is closed; anything else is rejected
/// when parsed from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Where a method carries its input parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended to the URL query string.
    Query,
    /// Sent as an `application/x-www-form-urlencoded` body.
    Body,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn placement(self) -> Placement {
        match self {
            HttpMethod::Get | HttpMethod::Delete => Placement::Query,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => Placement::Body,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ApiError::Contract(format!("unsupported request method: {s:?}")))
    }
}

/// A fully built request, bound to the deadline computed when it was built.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub deadline: Instant,
}

impl HttpRequest {
    /// Time left before the deadline; zero once it has passed.
    pub fn timeout_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response as returned by a transport, body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Success is exactly the range `200..300`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn methods_parse_from_their_names() {
        for method in HttpMethod::ALL {
            assert_eq!(method.as_str().parse::<HttpMethod>().unwrap(), method);
            assert_eq!(method.to_string(), method.as_str());
        }
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
    }

    #[test]
    fn unknown_method_is_a_contract_error() {
        let err = "OPTIONS".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, ApiError::Contract(_)));
        assert!("".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn query_methods_and_body_methods() {
        assert_eq!(HttpMethod::Get.placement(), Placement::Query);
        assert_eq!(HttpMethod::Delete.placement(), Placement::Query);
        assert_eq!(HttpMethod::Post.placement(), Placement::Body);
        assert_eq!(HttpMethod::Put.placement(), Placement::Body);
        assert_eq!(HttpMethod::Patch.placement(), Placement::Body);
    }

    #[test]
    fn success_range_is_half_open() {
        assert!(!response(199).is_success());
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(response(299).is_success());
        assert!(!response(300).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Post,
            url: "http://localhost/".to_string(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: None,
            deadline: Instant::now(),
        };
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("content-length"), None);
        assert_eq!(req.timeout_remaining(), Duration::ZERO);
    }
}
