//! Verify every operation against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector names an operation and its arguments, the request the client
//! must send, a simulated outcome (response or transport error) and the
//! expected result. Request bodies are compared as parsed JSON so field
//! ordering does not matter.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use thunder_client::{
    ClientConfig, HttpMethod, HttpRequest, HttpResponse, ThunderClient, ThunderError, Transport, TransportError,
};

const BASE_URL: &str = "http://localhost:3000";

/// Serves one simulated outcome and remembers the request it was given.
struct VectorTransport {
    outcome: Result<HttpResponse, TransportError>,
    seen: Mutex<Option<HttpRequest>>,
}

impl Transport for VectorTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        *self.seen.lock().unwrap() = Some(request.clone());
        self.outcome.clone()
    }
}

fn outcome(case: &Value) -> Result<HttpResponse, TransportError> {
    if let Some(sim) = case.get("simulated_response") {
        return Ok(HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            body: sim["body"].as_str().unwrap().to_string(),
        });
    }
    let err = &case["simulated_error"];
    match err.get("status") {
        Some(status) => Err(TransportError::Status(status.as_u64().unwrap() as u16)),
        None => Err(TransportError::Timeout("simulated".to_string())),
    }
}

fn client(case: &Value) -> (ThunderClient<Arc<VectorTransport>>, Arc<VectorTransport>) {
    let transport = Arc::new(VectorTransport {
        outcome: outcome(case),
        seen: Mutex::new(None),
    });
    let config = ClientConfig::new("apikey", "apisecret", "localhost").with_port(3000);
    (ThunderClient::with_transport(config, Arc::clone(&transport)), transport)
}

/// Run the named operation and convert its typed result back to JSON.
fn invoke(c: &ThunderClient<Arc<VectorTransport>>, case: &Value) -> Result<Value, ThunderError> {
    let args: Vec<&str> = case["args"].as_array().unwrap().iter().map(|a| a.as_str().unwrap()).collect();
    let message = &case["message"];
    let value = match case["operation"].as_str().unwrap() {
        "get_user_count" => serde_json::to_value(c.get_user_count()?),
        "get_users_in_channel" => serde_json::to_value(c.get_users_in_channel(args[0])?),
        "send_message_to_user" => serde_json::to_value(c.send_message_to_user(args[0], message)?),
        "send_message_to_channel" => serde_json::to_value(c.send_message_to_channel(args[0], message)?),
        "is_user_online" => serde_json::to_value(c.is_user_online(args[0])?),
        "disconnect_user" => serde_json::to_value(c.disconnect_user(args[0])?),
        other => panic!("unknown operation: {other}"),
    };
    Ok(value.unwrap())
}

fn run_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (c, transport) = client(case);
        let result = invoke(&c, case);

        // Verify request
        let expected_req = &case["expected_request"];
        let req = transport
            .seen
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| panic!("{name}: no request sent"));
        let method: HttpMethod = expected_req["method"].as_str().unwrap().parse().unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert_eq!(req.header("X-Thunder-Secret-Key"), Some("apisecret"), "{name}: secret header");
        match expected_req.get("body") {
            Some(body) => {
                let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent, body, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body should be None"),
        }

        // Verify result
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "MissingField" => assert!(matches!(err, ThunderError::MissingField(_)), "{name}: expected MissingField"),
                "InvalidField" => {
                    assert!(matches!(err, ThunderError::InvalidField { .. }), "{name}: expected InvalidField")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: result");
        }
    }
}

#[test]
fn user_vectors() {
    run_vectors(include_str!("../../test-vectors/users.json"));
}

#[test]
fn channel_vectors() {
    run_vectors(include_str!("../../test-vectors/channels.json"));
}
