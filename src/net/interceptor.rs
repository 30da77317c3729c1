//! Authenticated API client: bearer attachment, proactive refresh, and a
//! single refresh-and-retry after a 401.
//!
//! ARCHITECTURE
//! ============
//! Every non-auth request runs the same linear pipeline:
//!
//! 1. no token: forward as-is
//! 2. token with time left: attach it, forward
//! 3. token expiring soon: refresh first; attach the new token, or the
//!    stale one if the refresh failed, then forward
//! 4. a 401 answer: refresh once and resend once with the new token; if
//!    that refresh fails, sign out and return the original 401
//!
//! Requests to `/api/auth/...` get an existing token attached and skip
//! steps 3 and 4 so a refresh can never recurse into another refresh.
//!
//! TRADE-OFFS
//! ==========
//! Step 3 forwards with a stale token after a failed refresh and lets the
//! server decide. Concurrent requests may each start their own refresh; the
//! last token written wins.

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod tests;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::endpoints;
use super::transport::Transport;
use super::types::{ApiRequest, ApiResponse};
use crate::auth::gateway::AuthGateway;
use crate::auth::session::SessionOracle;
use crate::auth::store::TokenStore;
use crate::error::ApiError;

/// Sends API requests on behalf of the current session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    gateway: Arc<AuthGateway>,
    oracle: SessionOracle,
    store: Arc<TokenStore>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        gateway: Arc<AuthGateway>,
        oracle: SessionOracle,
        store: Arc<TokenStore>,
    ) -> Self {
        Self { transport, gateway, oracle, store }
    }

    #[must_use]
    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    #[must_use]
    pub fn oracle(&self) -> &SessionOracle {
        &self.oracle
    }

    /// Send `request` through the auth pipeline.
    ///
    /// # Errors
    ///
    /// Returns the transport failure, or the [`ApiError`] for a non-success
    /// status. After a failed 401 recovery this is the original 401.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if endpoints::is_auth_endpoint(&request.path) {
            let request = match self.store.token() {
                Some(token) => request.with_bearer(token),
                None => request,
            };
            return self.transport.send(request).await?.into_result();
        }

        let outgoing = self.prepare(request.clone()).await;
        let response = self.transport.send(outgoing).await?;
        if !response.is_unauthorized() {
            return response.into_result();
        }

        let original = ApiError::from_status(response.status, response.error_message());
        tracing::debug!(path = %request.path, "401 received; refreshing once");
        match self.gateway.refresh().await {
            Ok(token) => self.transport.send(request.with_bearer(token)).await?.into_result(),
            Err(refresh_err) => {
                tracing::warn!(path = %request.path, error = %refresh_err, "refresh after 401 failed; signing out");
                if let Err(e) = self.gateway.logout().await {
                    tracing::debug!(error = %e, "forced logout reported failure");
                }
                Err(original)
            }
        }
    }

    /// Send and decode a JSON response body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send`], plus [`ApiError::Decode`] for a body
    /// that does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Steps 1-3: decide which token, if any, goes on the request.
    async fn prepare(&self, request: ApiRequest) -> ApiRequest {
        let Some(token) = self.store.token() else {
            return request;
        };
        if !self.oracle.is_expiring_soon() {
            return request.with_bearer(token);
        }

        tracing::debug!(path = %request.path, "token expiring soon; refreshing before send");
        match self.gateway.refresh().await {
            Ok(fresh) => request.with_bearer(fresh),
            Err(e) => {
                tracing::warn!(path = %request.path, error = %e, "proactive refresh failed; sending stale token");
                request.with_bearer(token)
            }
        }
    }
}
