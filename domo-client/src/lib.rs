//! Private HTTP client for CAME Domotic gateway communication
//!
//! This crate provides a minimal HTTP client specifically designed for the
//! CAME Domotic session-layer endpoint. Every request is an HTTP POST of a
//! single form-encoded `command` field carrying a JSON envelope; the gateway
//! answers with a JSON body. A plain GET against the same endpoint is used
//! once, at session construction, to verify that the host actually exposes
//! the API.

mod error;

pub use error::DomoError;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use serde_json::Value;

/// A minimal HTTP client bound to one gateway endpoint
///
/// The endpoint URL is fixed at construction time (`http://{host}/domo/`).
/// Cloning is cheap: the underlying `reqwest::Client` shares its connection
/// pool across clones.
#[derive(Debug, Clone)]
pub struct DomoClient {
    http: reqwest::Client,
    endpoint_url: String,
}

impl DomoClient {
    /// Create a client for the given gateway host (e.g. `"192.168.1.3"`)
    pub fn new(host: &str) -> Self {
        Self::with_http_client(reqwest::Client::new(), host)
    }

    /// Create a client reusing a caller-supplied `reqwest::Client`
    pub fn with_http_client(http: reqwest::Client, host: &str) -> Self {
        Self {
            http,
            endpoint_url: format!("http://{host}/domo/"),
        }
    }

    /// The fixed gateway endpoint URL
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Send a command envelope and return the decoded JSON response body
    ///
    /// The payload is serialized and sent as the single form field `command`,
    /// with a `Connection: Keep-Alive` header as the gateway expects. Any 2xx
    /// answer is decoded as JSON; everything else is an error.
    pub async fn post(&self, payload: &Value, timeout: Duration) -> Result<Value, DomoError> {
        let response = self
            .http
            .post(&self.endpoint_url)
            .headers(Self::default_headers())
            .form(&[("command", payload.to_string())])
            .timeout(timeout)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomoError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(Self::transport_error)?;
        serde_json::from_str(&body).map_err(|e| DomoError::Decode(e.to_string()))
    }

    /// Probe the endpoint with a plain GET, succeeding on any 2xx status
    ///
    /// Used to validate the configured host before a session is established.
    pub async fn probe(&self, timeout: Duration) -> Result<(), DomoError> {
        let response = self
            .http
            .get(&self.endpoint_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomoError::Status(status.as_u16()));
        }

        Ok(())
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("Keep-Alive"));
        headers
    }

    fn transport_error(e: reqwest::Error) -> DomoError {
        if e.is_timeout() {
            DomoError::Timeout(e.to_string())
        } else {
            DomoError::Network(e.to_string())
        }
    }
}
