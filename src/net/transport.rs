//! Transport seam between the API client and the wire.
//!
//! The interceptor is constructed against this trait rather than a concrete
//! HTTP client so unit tests can inject scripted fakes. [`HttpTransport`]
//! is the production implementation over `reqwest` with the configured
//! request timeout; a hung call surfaces as a normal network error.

use std::future::Future;

use serde_json::Value;

use crate::config::ApiConfig;
use crate::net::error::ApiError;

/// One outbound API call, before the interceptor decorates it.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: reqwest::Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: reqwest::Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            bearer: None,
            body: None,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response: status plus decoded JSON body (`Null` when empty).
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and yields the raw response.
///
/// Implementations report connection-level failures as `Err`; an HTTP error
/// status is a successful send and comes back as an [`ApiResponse`].
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send {
        T::send(self, request)
    }
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

/// `reqwest`-backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the underlying client cannot be
    /// constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send {
        async move {
            let url = format!("{}{}", self.base_url, request.path);
            let mut builder = self.client.request(request.method, url);
            if let Some(token) = &request.bearer {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;

            // Non-JSON bodies (proxies, crash pages) still carry a message.
            let body = if text.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "message": text }))
            };

            Ok(ApiResponse { status, body })
        }
    }
}
