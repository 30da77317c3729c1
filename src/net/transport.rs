//! HTTP transport seam.
//!
//! Client-side (hydrate): `gloo-net` fetch calls from the browser.
//! Native: `reqwest` with rustls.
//!
//! ERROR HANDLING
//! ==============
//! A transport returns `Ok` for every response that reached the server,
//! whatever its status; only connection-level failures are `Err`. Status
//! policy belongs to the interceptor.

use crate::error::ApiError;

use super::types::{ApiRequest, ApiResponse};

/// Sends one request to the backend.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the request never produced a response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

// =============================================================================
// NATIVE
// =============================================================================

/// `reqwest`-backed transport.
#[cfg(feature = "native")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "native")]
impl HttpTransport {
    /// Build a transport for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(feature = "native")]
fn reqwest_method(method: super::types::Method) -> reqwest::Method {
    use super::types::Method;
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = join_url(&self.base_url, &request.path);
        let mut builder = self.client.request(reqwest_method(request.method), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, path = %request.path, "sending request");
        let resp = builder.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(method = %request.method, path = %request.path, status, "response received");
        Ok(ApiResponse { status, body })
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// `gloo-net` fetch transport for the browser.
#[cfg(feature = "hydrate")]
#[derive(Debug, Clone)]
pub struct BrowserTransport {
    base_url: String,
}

#[cfg(feature = "hydrate")]
impl BrowserTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
#[async_trait::async_trait(?Send)]
impl Transport for BrowserTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        use super::types::Method;
        use gloo_net::http::Request;

        let url = join_url(&self.base_url, &request.path);
        let mut builder = match request.method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Put => Request::put(&url),
            Method::Patch => Request::patch(&url),
            Method::Delete => Request::delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }
        let sent = match &request.body {
            Some(body) => builder.json(body).map_err(|e| ApiError::Encode(e.to_string()))?.send().await,
            None => builder.send().await,
        };
        let resp = sent.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}
