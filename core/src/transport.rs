//! Blocking `Transport` backed by a pooled `ureq::Agent`.

use ureq::{Agent, RequestBuilder};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Default transport used by `ThunderClient::new`.
///
/// The agent carries `transport_timeout` as its global timeout; the per-call
/// timeouts on each `HttpRequest` replace it for that call. Error statuses
/// surface as `TransportError::Status`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!config.verify_tls)
            .build();
        let agent = Agent::config_builder()
            .timeout_global(Some(config.transport_timeout))
            .tls_config(tls)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => prepare(request, self.agent.get(url)).call(),
            HttpMethod::Delete => prepare(request, self.agent.delete(url)).call(),
            HttpMethod::Post => send(request, prepare(request, self.agent.post(url))),
            HttpMethod::Put => send(request, prepare(request, self.agent.put(url))),
            HttpMethod::Patch => send(request, prepare(request, self.agent.patch(url))),
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        // A body that fails mid-read discards the status line already seen;
        // the client then falls back to its default status.
        let body = response.body_mut().read_to_string().map_err(map_error)?;

        Ok(HttpResponse { status, body })
    }
}

fn prepare<B>(request: &HttpRequest, mut builder: RequestBuilder<B>) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        // ureq derives Host from the URL.
        if name.eq_ignore_ascii_case("host") {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    let mut config = builder.config();
    if let Some(timeout) = request.timeout {
        config = config.timeout_global(Some(timeout));
    }
    if let Some(timeout) = request.connect_timeout {
        config = config.timeout_connect(Some(timeout));
    }
    config.build()
}

fn send(
    request: &HttpRequest,
    builder: RequestBuilder<ureq::typestate::WithBody>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::StatusCode(status) => TransportError::Status(status),
        ureq::Error::Timeout(which) => TransportError::Timeout(format!("{which:?}")),
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => TransportError::Timeout(io.to_string()),
        other => TransportError::Network(other.to_string()),
    }
}
