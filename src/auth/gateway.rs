//! Login, refresh, and logout against the auth endpoints.
//!
//! ARCHITECTURE
//! ============
//! The gateway is the only writer of new tokens. It talks to the transport
//! directly rather than through the interceptor so a refresh can never
//! trigger another refresh.
//!
//! ```text
//! ANONYMOUS --login ok--> AUTHENTICATED --refresh--> REFRESHING
//!     ^                        |                      |     |
//!     |                        +--logout--------------+     ok
//!     +---------refresh failed / logout-------------+       |
//!                                               AUTHENTICATED
//! ```
//!
//! TRADE-OFFS
//! ==========
//! Concurrent refreshes are not coalesced. Each one completes and the last
//! response to land wins the token slot.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::store::TokenStore;
use crate::error::ApiError;
use crate::net::endpoints;
use crate::net::transport::Transport;
use crate::net::types::ApiRequest;
use crate::routes::{Navigator, Route};

/// Where the session stands from the gateway's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Authenticated,
    Refreshing,
}

/// Username/password pair posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("username", &self.username).finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

/// Why a login attempt failed, in terms a login form can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginFailure {
    BadCredentials,
    Deactivated,
    AccessDenied,
    Unavailable,
}

impl LoginFailure {
    /// Classify the error returned by [`AuthGateway::login`].
    #[must_use]
    pub fn classify(err: &ApiError) -> Self {
        let message = err.server_message().to_lowercase();
        let deactivated = message.contains("inactive") || message.contains("deactivated");
        match err {
            ApiError::AuthRejected { .. } if deactivated => Self::Deactivated,
            ApiError::AuthRejected { .. } => Self::BadCredentials,
            ApiError::Forbidden { .. } if deactivated => Self::Deactivated,
            ApiError::Forbidden { .. } => Self::AccessDenied,
            _ => Self::Unavailable,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::BadCredentials => "Invalid username or password. Please try again.",
            Self::Deactivated => "Your account has been deactivated. Please contact administrator.",
            Self::AccessDenied => "Access denied. Your account may not be active.",
            Self::Unavailable => "Login failed. Please try again later.",
        }
    }
}

/// Performs auth calls and keeps the token slot in step with their outcome.
pub struct AuthGateway {
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    phase: Mutex<AuthPhase>,
}

impl AuthGateway {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: Arc<TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        let phase = if store.has_token() { AuthPhase::Authenticated } else { AuthPhase::Anonymous };
        Self { transport, store, navigator, phase: Mutex::new(phase) }
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, next: AuthPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != next {
            tracing::debug!(from = ?*phase, to = ?next, "auth phase changed");
            *phase = next;
        }
    }

    /// Exchange credentials for a token and store it.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error unchanged; the token slot is
    /// left as it was. Use [`LoginFailure::classify`] for messaging.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = ApiRequest::post(endpoints::LOGIN).with_json(credentials)?;
        match self.request_token(request).await {
            Ok(token) => {
                self.store.set(token);
                self.set_phase(AuthPhase::Authenticated);
                tracing::info!(username = %credentials.username, "logged in");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(username = %credentials.username, error = %e, "login failed");
                Err(e)
            }
        }
    }

    /// Trade the current token for a fresh one. Returns the new token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoToken`] without a network call when nothing is
    /// stored. Any other failure clears the token, redirects to login, and
    /// is returned unchanged.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let Some(current) = self.store.token() else {
            return Err(ApiError::NoToken);
        };

        self.set_phase(AuthPhase::Refreshing);
        let request = ApiRequest::post(endpoints::REFRESH).with_body(json!({})).with_bearer(current);
        match self.request_token(request).await {
            Ok(token) => {
                self.store.set(token.clone());
                self.set_phase(AuthPhase::Authenticated);
                tracing::debug!("token refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed; signing out");
                self.deauthenticate();
                Err(e)
            }
        }
    }

    /// Invalidate the token server-side, then always sign out locally.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoToken`] when nothing was stored, or the logout
    /// endpoint's failure. Local sign-out has already happened either way.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let Some(token) = self.store.token() else {
            self.deauthenticate();
            return Err(ApiError::NoToken);
        };

        let request = ApiRequest::post(endpoints::LOGOUT).with_body(json!({})).with_bearer(token);
        let outcome = match self.transport.send(request).await {
            Ok(resp) => resp.into_result().map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "logout endpoint failed; clearing token anyway");
        }
        self.deauthenticate();
        tracing::info!("logged out");
        outcome
    }

    fn deauthenticate(&self) {
        self.store.clear();
        self.set_phase(AuthPhase::Anonymous);
        self.navigator.navigate(&Route::Login);
    }

    async fn request_token(&self, request: ApiRequest) -> Result<String, ApiError> {
        let resp = self.transport.send(request).await?.into_result()?;
        let body: TokenResponse = resp.json()?;
        if body.access_token.trim().is_empty() {
            return Err(ApiError::Decode("empty accessToken".into()));
        }
        Ok(body.access_token)
    }
}
