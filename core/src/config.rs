//! Connection parameters and credentials for a Thunder server.
//!
//! # Design
//! `ClientConfig` is built once and moved into a `ThunderClient`, which never
//! mutates it. Two timeout layers are kept on purpose: `transport_timeout`
//! is installed on the connection pool, while `connect_timeout` and
//! `request_timeout` are attached to every request and take precedence for
//! that request.

use std::time::Duration;

use crate::error::ThunderError;

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub api_secret: String,
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub verify_tls: bool,
    pub transport_timeout: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            use_tls: false,
            verify_tls: true,
            transport_timeout: DEFAULT_TRANSPORT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Skip certificate verification for self-signed deployments.
    pub fn with_tls_verification(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.transport_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `{http|https}://{host}:{port}`
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Value sent in the `Host` header.
    pub fn host_header(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Read the configuration from `THUNDER_*` environment variables.
    ///
    /// `THUNDER_API_KEY`, `THUNDER_API_SECRET` and `THUNDER_HOST` are
    /// required; `THUNDER_PORT` and `THUNDER_USE_TLS` fall back to defaults.
    pub fn from_env() -> Result<Self, ThunderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ThunderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ThunderError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required("THUNDER_API_KEY")?,
            required("THUNDER_API_SECRET")?,
            required("THUNDER_HOST")?,
        );

        if let Some(port) = lookup("THUNDER_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ThunderError::Config(format!("THUNDER_PORT is not a valid port: {port}")))?;
        }
        if let Some(flag) = lookup("THUNDER_USE_TLS") {
            config.use_tls = parse_flag(&flag)
                .ok_or_else(|| ThunderError::Config(format!("THUNDER_USE_TLS is not a boolean: {flag}")))?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
