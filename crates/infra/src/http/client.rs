use std::time::Duration;

use async_trait::async_trait;
use courier_domain::{EngineError, HttpMethod};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use super::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use crate::errors::InfraError;

/// reqwest-backed [`Transport`]
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Start building a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, EngineError> {
        Self::builder().build()
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = to_reqwest_method(request.method);
        let url = request.url;

        let mut builder = self.client.request(method.clone(), &url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(%method, %url, "sending HTTP request");

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_error)?;

        debug!(%method, %url, status, bytes = body.len(), "received HTTP response");

        Ok(TransportResponse { status, body: body.to_vec() })
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: None,
            user_agent: Some(concat!("courier/", env!("CARGO_PKG_VERSION")).to_string()),
            default_headers: None,
        }
    }
}

impl HttpTransportBuilder {
    /// Hard upper bound enforced by reqwest, independent of the executor's
    /// own deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpTransport, EngineError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| EngineError::from(InfraError::from(err)))?;

        Ok(HttpTransport { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(err.to_string());
    }
    if err.is_builder() {
        return TransportError::InvalidRequest(err.to_string());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return TransportError::Connect(err.to_string());
        }
    }
    // Anything past connect (request write, body read, decode) may have
    // reached the server already.
    TransportError::Other(err.to_string())
}
