//! Thunder REST API client.
//!
//! # Design
//! `ThunderClient` holds an immutable `ClientConfig` and a `Transport`, and
//! carries no mutable state between calls. Every operation follows the same
//! pipeline: `make_url` builds the path, `build_request` produces a fresh
//! `HttpRequest`, `make_request` runs it and folds any outcome into a
//! `ResponseEnvelope`, and `build_response` extracts the one field the
//! operation returns.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::envelope::{build_response, ResponseEnvelope};
use crate::error::{ThunderError, ThunderResult};
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::transport::UreqTransport;

pub const API_VERSION: &str = "1.0.0";
pub const SECRET_KEY_HEADER: &str = "X-Thunder-Secret-Key";

#[derive(Debug, Clone)]
pub struct ThunderClient<T = UreqTransport> {
    config: ClientConfig,
    base_url: String,
    transport: T,
}

impl ThunderClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ThunderClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url(),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{base}/api/{version}/{api_key}/{command}/[{arg}/...]`
    ///
    /// Segments are percent-encoded, so a user id containing `/` stays a
    /// single segment.
    pub fn make_url(&self, command: &str, args: &[&str]) -> String {
        let mut url = format!(
            "{}/api/{}/{}/{}/",
            self.base_url,
            API_VERSION,
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(command)
        );
        for arg in args {
            url.push_str(&urlencoding::encode(arg));
            url.push('/');
        }
        url
    }

    /// Build the request for one call without sending it.
    ///
    /// Every supported method carries the same headers and per-call timeouts.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        command: &str,
        args: &[&str],
        body: Option<&B>,
    ) -> ThunderResult<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let body = match method {
            HttpMethod::Get | HttpMethod::Delete => None,
            HttpMethod::Post => Some(serialize_body(body)?),
            HttpMethod::Put | HttpMethod::Patch => {
                return Err(ThunderError::UnsupportedMethod(method.to_string()));
            }
        };

        Ok(HttpRequest {
            method,
            url: self.make_url(command, args),
            headers: vec![
                ("Host".to_string(), self.config.host_header()),
                ("Content-Type".to_string(), "application/json".to_string()),
                (SECRET_KEY_HEADER.to_string(), self.config.api_secret.clone()),
            ],
            body,
            timeout: Some(self.config.request_timeout),
            connect_timeout: Some(self.config.connect_timeout),
        })
    }

    /// Send one request and normalize the outcome.
    ///
    /// Returns `Err` only for `UnsupportedMethod`, before any I/O. Transport
    /// failures, error statuses and serialization failures are stored in the
    /// envelope.
    pub fn make_request<B>(
        &self,
        method: HttpMethod,
        command: &str,
        args: &[&str],
        body: Option<&B>,
    ) -> ThunderResult<ResponseEnvelope>
    where
        B: Serialize + ?Sized,
    {
        let request = match self.build_request(method, command, args, body) {
            Ok(request) => request,
            Err(err @ ThunderError::UnsupportedMethod(_)) => return Err(err),
            Err(err) => {
                tracing::warn!(%method, command, error = %err, "could not build thunder request");
                return Ok(ResponseEnvelope::from_error(err));
            }
        };

        tracing::debug!(%method, url = %request.url, "sending thunder request");
        let envelope = match self.transport.execute(&request) {
            Ok(response) => ResponseEnvelope::from_response(&response),
            Err(err) => {
                tracing::warn!(%method, url = %request.url, error = %err, "thunder request failed");
                ResponseEnvelope::from_transport_error(err)
            }
        };
        tracing::debug!(%method, url = %request.url, status = envelope.status, "thunder request finished");

        Ok(envelope)
    }

    /// Number of users currently connected.
    pub fn get_user_count(&self) -> ThunderResult<Option<u64>> {
        let envelope = self.make_request::<Value>(HttpMethod::Get, "users", &[], None)?;
        extract(&envelope, "count")
    }

    /// Ids of the users subscribed to `channel`.
    pub fn get_users_in_channel(&self, channel: &str) -> ThunderResult<Option<Vec<String>>> {
        let envelope = self.make_request::<Value>(HttpMethod::Get, "channels", &[channel], None)?;
        extract(&envelope, "users")
    }

    /// Deliver `message` to one user; returns the delivery count.
    pub fn send_message_to_user<M>(&self, userid: &str, message: &M) -> ThunderResult<Option<u64>>
    where
        M: Serialize + ?Sized,
    {
        let envelope = self.make_request(HttpMethod::Post, "users", &[userid], Some(message))?;
        extract(&envelope, "count")
    }

    /// Deliver `message` to every member of `channel`; returns the delivery count.
    pub fn send_message_to_channel<M>(&self, channel: &str, message: &M) -> ThunderResult<Option<u64>>
    where
        M: Serialize + ?Sized,
    {
        let envelope = self.make_request(HttpMethod::Post, "channels", &[channel], Some(message))?;
        extract(&envelope, "count")
    }

    /// Presence flag; servers that report `0`/`1` are read as booleans.
    pub fn is_user_online(&self, userid: &str) -> ThunderResult<Option<bool>> {
        let envelope = self.make_request::<Value>(HttpMethod::Get, "users", &[userid], None)?;
        build_response(&envelope, Some("online"))?
            .map(|value| decode("online", presence_flag(value)))
            .transpose()
    }

    /// `Some(true)` when the server answers 204, `None` otherwise.
    pub fn disconnect_user(&self, userid: &str) -> ThunderResult<Option<bool>> {
        let envelope = self.make_request::<Value>(HttpMethod::Delete, "users", &[userid], None)?;
        Ok(build_response(&envelope, None)?.and_then(|value| value.as_bool()))
    }
}

fn serialize_body<B: Serialize + ?Sized>(body: Option<&B>) -> ThunderResult<String> {
    match body {
        Some(body) => serde_json::to_string(body).map_err(ThunderError::Serialization),
        None => Ok("null".to_string()),
    }
}

fn extract<V: DeserializeOwned>(envelope: &ResponseEnvelope, field: &str) -> ThunderResult<Option<V>> {
    build_response(envelope, Some(field))?
        .map(|value| decode(field, value))
        .transpose()
}

fn decode<V: DeserializeOwned>(field: &str, value: Value) -> ThunderResult<V> {
    serde_json::from_value(value).map_err(|source| ThunderError::InvalidField {
        field: field.to_string(),
        source,
    })
}

/// Map integer `0`/`1` onto booleans; anything else is left for `decode`.
fn presence_flag(value: Value) -> Value {
    match value.as_u64() {
        Some(0) => Value::Bool(false),
        Some(1) => Value::Bool(true),
        _ => value,
    }
}
