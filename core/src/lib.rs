//! Blocking client for the Thunder push-notification REST API.
//!
//! # Overview
//! `ThunderClient` wraps the six Thunder calls (user count, channel
//! membership, messaging a user or a channel, presence, disconnect) behind
//! typed methods. Each call builds a URL, issues exactly one HTTP request and
//! extracts one field from the JSON response.
//!
//! # Design
//! - `ThunderClient` is stateless apart from its immutable `ClientConfig`.
//! - Requests are plain data (`HttpRequest`) executed by a `Transport`; the
//!   default `UreqTransport` owns a pooled `ureq::Agent`.
//! - Network and HTTP failures are folded into a `ResponseEnvelope` and
//!   surface as `Ok(None)`. Only an unsupported method or a malformed
//!   success response is returned as `Err`.
//! - The library emits `tracing` events and never installs a subscriber.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{ThunderClient, API_VERSION, SECRET_KEY_HEADER};
pub use config::ClientConfig;
pub use envelope::{build_response, ResponseEnvelope};
pub use error::{ThunderError, ThunderResult, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use transport::UreqTransport;
