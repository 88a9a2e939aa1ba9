use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use portico_core::config::UpstreamConfig;
use portico_core::domain::actor::BearerToken;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not construct the backend http client: {0}")]
    Build(String),
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("backend response body could not be read: {0}")]
    Body(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One outbound call to the platform backend. The bearer token is the
/// inbound `Authorization` header forwarded verbatim; calls without one are
/// unauthenticated probes (health only).
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub token: Option<BearerToken>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        UpstreamRequest { method, path: path.into(), query: Vec::new(), token: None, body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn with_token(mut self, token: &BearerToken) -> Self {
        self.token = Some(token.clone());
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Backend reply before normalization: the status, the two headers the
/// gateway forwards on document downloads, and the raw body.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        portico_core::envelope::is_success_status(self.status)
    }
}

#[async_trait]
pub trait PlatformTransport: Send + Sync {
    async fn execute(&self, request: UpstreamRequest) -> Result<RawResponse, TransportError>;
}

/// Transport that never reaches the network; every call reports an empty
/// 200. Handy as a stand-in where no backend traffic is expected.
#[derive(Default)]
pub struct NoopPlatformTransport;

#[async_trait]
impl PlatformTransport for NoopPlatformTransport {
    async fn execute(&self, _request: UpstreamRequest) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: 200,
            content_type: None,
            content_disposition: None,
            body: Bytes::new(),
        })
    }
}

/// reqwest-backed transport. One client, one configured timeout; individual
/// calls never override it.
pub struct HttpPlatformTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlatformTransport {
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| TransportError::Build(err.to_string()))?;

        Ok(HttpPlatformTransport { client, base_url: config.base_url_trimmed().to_string() })
    }
}

#[async_trait]
impl PlatformTransport for HttpPlatformTransport {
    async fn execute(&self, request: UpstreamRequest) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.to_reqwest(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            builder = builder.header(reqwest::header::AUTHORIZATION, token.header_value());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response =
            builder.send().await.map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status().as_u16();
        let content_type = header_string(response.headers(), reqwest::header::CONTENT_TYPE);
        let content_disposition =
            header_string(response.headers(), reqwest::header::CONTENT_DISPOSITION);
        let body =
            response.bytes().await.map_err(|err| TransportError::Body(err.to_string()))?;

        Ok(RawResponse { status, content_type, content_disposition, body })
    }
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}
