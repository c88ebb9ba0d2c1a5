//! Normalized result of a single request, and field extraction from it.
//!
//! # Design
//! `ThunderClient::make_request` never fails on network or HTTP errors;
//! instead every outcome is folded into a `ResponseEnvelope`. The status
//! starts at 500 and is only replaced once a response (or an error carrying
//! a status) is seen, so a timeout and a server crash look the same to
//! `build_response`.

use serde_json::{Map, Value};

use crate::error::{ThunderError, TransportError};
use crate::http::HttpResponse;

/// Status assumed until a response resolves it.
pub const DEFAULT_STATUS: u16 = 500;

#[derive(Debug)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub data: Map<String, Value>,
    pub error: Option<ThunderError>,
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            data: Map::new(),
            error: None,
        }
    }
}

impl ResponseEnvelope {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            data: normalize_body(&response.body),
            error: None,
        }
    }

    /// Keeps the status when the transport saw one, 500 otherwise.
    pub fn from_transport_error(error: TransportError) -> Self {
        Self {
            status: error.status().unwrap_or(DEFAULT_STATUS),
            data: Map::new(),
            error: Some(ThunderError::Transport(error)),
        }
    }

    /// The request could not be sent at all.
    pub fn from_error(error: ThunderError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Extract the caller-visible result from an envelope.
///
/// - 200: the requested field, or the whole body when no field is requested.
///   A requested field that is absent is `MissingField`.
/// - 204 with no field requested: `true`.
/// - anything else: `None`.
pub fn build_response(envelope: &ResponseEnvelope, field: Option<&str>) -> Result<Option<Value>, ThunderError> {
    match (envelope.status, field) {
        (200, Some(field)) => envelope
            .data
            .get(field)
            .cloned()
            .map(Some)
            .ok_or_else(|| ThunderError::MissingField(field.to_string())),
        (200, None) => Ok(Some(Value::Object(envelope.data.clone()))),
        (204, None) => Ok(Some(Value::Bool(true))),
        _ => Ok(None),
    }
}

/// Decode a response body into a JSON object.
///
/// Empty bodies, invalid JSON and empty JSON values become `{}`, as does any
/// non-object value since no field can be looked up on it.
pub(crate) fn normalize_body(body: &str) -> Map<String, Value> {
    if body.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            if !is_empty_value(&other) {
                tracing::warn!(body = %other, "response body is not a JSON object, ignoring it");
            }
            Map::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "response body is not valid JSON, ignoring it");
            Map::new()
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
