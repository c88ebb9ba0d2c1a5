//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! Requests and responses are plain data. `ThunderClient` builds a fresh
//! `HttpRequest` for every call (no request options are stored on the client
//! and mutated between calls), hands it to a `Transport`, and parses the
//! resulting `HttpResponse`. Swapping the transport keeps the client
//! deterministic under test.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ThunderError, TransportError};

/// HTTP method for a request.
///
/// Only `Get`, `Post` and `Delete` are dispatched by `ThunderClient`; the
/// other verbs are rejected with `ThunderError::UnsupportedMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ThunderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ThunderError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Overall deadline for this call. Overrides the transport default.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Executes one `HttpRequest`.
///
/// Implementations report error statuses they refuse to treat as responses
/// through `TransportError::Status`; the client handles both shapes the same
/// way. Transports must be shareable so one client can serve many threads.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}
