use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{ProxyError, Result};
use crate::upstream::types::GraphQlRequest;

pub const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Raw upstream reply, before any GraphQL decoding.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn throttled(retry_after: Option<&str>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: retry_after.map(str::to_string),
            body: String::new(),
        }
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }
}

/// Sends one GraphQL request to the upstream.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &GraphQlRequest) -> Result<TransportResponse>;
}

/// HTTPS transport authenticated with the shop access token.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: String, access_token: &str) -> Result<Self> {
        let mut token = HeaderValue::from_str(access_token)
            .map_err(|_| ProxyError::ConfigurationError("Access token is not a valid header value".to_string()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &GraphQlRequest) -> Result<TransportResponse> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// In-process transport that replays queued responses in order and records
/// every request it receives. Used by tests and local demos.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<TransportResponse>>>,
    requests: Arc<Mutex<Vec<GraphQlRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: TransportResponse) -> &Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
        self
    }

    pub fn push_json(&self, body: serde_json::Value) -> &Self {
        self.push(TransportResponse::ok(body.to_string()))
    }

    pub fn requests(&self) -> Vec<GraphQlRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|requests| requests.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &GraphQlRequest) -> Result<TransportResponse> {
        self.requests
            .lock()
            .map_err(|_| ProxyError::InternalError("Scripted transport lock poisoned".to_string()))?
            .push(request.clone());

        let next = self
            .responses
            .lock()
            .map_err(|_| ProxyError::InternalError("Scripted transport lock poisoned".to_string()))?
            .pop_front();

        next.ok_or_else(|| ProxyError::InternalError("No scripted upstream response left".to_string()))
    }
}
