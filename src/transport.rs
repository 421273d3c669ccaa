//! HTTP transport seam.
//!
//! The context issues verbs through the [`Transport`] trait so tests can
//! script responses and hosts can substitute their own HTTP stack. The
//! production implementation is [`ReqwestTransport`].
//!
//! Contract: a 2xx response resolves to [`TransportResponse`]; any other
//! status fails with [`ContextError::Http`] carrying the status and body.
//! Timeouts and connection pooling live here, not in the context layer.

use crate::error::{ContextError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Request and response header map. Response header names are lowercased.
pub type Headers = BTreeMap<String, String>;

/// A settled HTTP response as seen by the context layer.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> TransportResponse {
        TransportResponse {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> TransportResponse {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as UTF-8, if valid.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Abstraction for the underlying HTTP stack.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform a GET request.
    async fn get(&self, uri: &str, headers: &Headers) -> Result<TransportResponse>;

    /// Perform a PUT request with a body.
    async fn put(&self, uri: &str, body: Bytes, headers: &Headers) -> Result<TransportResponse>;

    /// Perform a POST request with a body.
    async fn post(&self, uri: &str, body: Bytes, headers: &Headers) -> Result<TransportResponse>;

    /// Perform a DELETE request.
    async fn delete(&self, uri: &str, headers: &Headers) -> Result<TransportResponse>;
}

/// Configuration for [`ReqwestTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Connection pool size per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            request_timeout_ms: 30_000,
            pool_max_idle_per_host: 8,
        }
    }
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> ReqwestTransport {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> ReqwestTransport {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .unwrap_or_default();
        ReqwestTransport { client }
    }

    /// Wrap an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> ReqwestTransport {
        ReqwestTransport { client }
    }

    /// The underlying `reqwest` client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn request(
        &self,
        method: reqwest::Method,
        uri: &str,
        body: Option<Bytes>,
        headers: &Headers,
    ) -> Result<TransportResponse> {
        let mut builder = self.client.request(method, uri);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ContextError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let mut resp_headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                resp_headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ContextError::Transport(e.to_string()))?;

        let response = TransportResponse {
            status,
            headers: resp_headers,
            body,
        };
        if !response.is_success() {
            return Err(ContextError::Http {
                status,
                body: response.body_str().unwrap_or_default().to_string(),
            });
        }
        Ok(response)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, uri: &str, headers: &Headers) -> Result<TransportResponse> {
        self.request(reqwest::Method::GET, uri, None, headers).await
    }

    async fn put(&self, uri: &str, body: Bytes, headers: &Headers) -> Result<TransportResponse> {
        self.request(reqwest::Method::PUT, uri, Some(body), headers).await
    }

    async fn post(&self, uri: &str, body: Bytes, headers: &Headers) -> Result<TransportResponse> {
        self.request(reqwest::Method::POST, uri, Some(body), headers).await
    }

    async fn delete(&self, uri: &str, headers: &Headers) -> Result<TransportResponse> {
        self.request(reqwest::Method::DELETE, uri, None, headers).await
    }
}
