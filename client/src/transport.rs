//! HTTP transport seam
//!
//! [`ApiClient`](crate::api::ApiClient) speaks to the server only through
//! [`HttpTransport`], so the retry and session logic can run against a
//! scripted transport in tests and against [`ReqwestTransport`] in use.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use cn_core::domain::entities::token::AccessToken;
use cn_core::domain::events::BroadcastEvent;

use crate::error::{ClientError, ClientResult};
use crate::events;

/// One API call, independent of the HTTP library
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/api/posts`
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<AccessToken>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body of a completed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a success body, or turn an error status into [`ClientError::Http`]
    pub fn into_json<T: DeserializeOwned>(self) -> ClientResult<T> {
        if !self.is_success() {
            return Err(self.into_error());
        }
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn into_error(self) -> ClientError {
        ClientError::Http {
            status: self.status,
            body: self.body,
        }
    }
}

/// Sends API requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one request
    ///
    /// # Returns
    ///
    /// * `Ok(ApiResponse)` - Any response, including error statuses
    /// * `Err(ClientError::Transport)` - No response was received
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}

/// [`HttpTransport`] over reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    streaming: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for the server at `base_url`
    ///
    /// `timeout` bounds ordinary calls. The event stream is long-lived and
    /// only bounded while connecting.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let streaming = reqwest::Client::builder().connect_timeout(timeout).build()?;

        Ok(Self {
            http,
            streaming,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Open the server-sent event stream
    ///
    /// The stream ends when the server closes the connection; callers
    /// reconnect and refetch the feed.
    pub async fn subscribe_events(
        &self,
    ) -> ClientResult<impl Stream<Item = ClientResult<BroadcastEvent>>> {
        let response = self
            .streaming
            .get(self.url("/api/events"))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Event stream connected");
        Ok(events::decode_stream(response.bytes_stream()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .header(ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(method = %request.method, path = %request.path, status, "API call completed");
        Ok(ApiResponse { status, body })
    }
}
