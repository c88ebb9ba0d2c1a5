//! Error types for the Thunder client.
//!
//! # Design
//! Network and HTTP failures never reach the caller of a public operation:
//! they are captured as a `TransportError` inside the `ResponseEnvelope` and
//! the operation resolves to `None`. Only `UnsupportedMethod`, `MissingField`
//! and `InvalidField` escape, because they indicate a programming error or a
//! server that broke its contract rather than a transient condition.

use thiserror::Error;

/// Errors produced by `ThunderClient`.
#[derive(Debug, Error)]
pub enum ThunderError {
    /// The dispatcher was asked for a verb other than GET, POST or DELETE.
    #[error("unsupported request method: {0}")]
    UnsupportedMethod(String),

    /// The server answered 200 but the expected field is absent.
    #[error("response is missing field `{0}`")]
    MissingField(String),

    /// The field is present but has the wrong JSON type.
    #[error("response field `{field}` has an unexpected type: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid or incomplete client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures reported by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with an error status (4xx/5xx).
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connect or overall timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// DNS, connection, TLS or I/O failure.
    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// The status code carried by the error, if the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status(status) => Some(*status),
            TransportError::Timeout(_) | TransportError::Network(_) => None,
        }
    }
}

pub type ThunderResult<T> = Result<T, ThunderError>;
