//! Fakes shared by unit tests: tokens, clock, transport, and navigator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use crate::auth::clock::Clock;
use crate::auth::store::{MemoryStorage, TokenStore};
use crate::error::ApiError;
use crate::net::transport::Transport;
use crate::net::types::{ApiRequest, ApiResponse};
use crate::routes::{Navigator, Route};

/// Fixed "now" for every test that cares about expiry.
pub const NOW: i64 = 1_700_000_000;

// =============================================================================
// TOKENS
// =============================================================================

/// Build an unsigned compact token around `payload`.
#[must_use]
pub fn make_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// Token whose payload segment is `raw` verbatim.
#[must_use]
pub fn token_with_raw_payload(raw: &str) -> String {
    format!("eyJhbGciOiJIUzI1NiJ9.{raw}.signature")
}

/// Token for `role` expiring `secs_from_now` after [`NOW`].
#[must_use]
pub fn token_expiring_in(secs_from_now: i64, role: &str) -> String {
    make_token(&json!({ "exp": NOW + secs_from_now, "sub": "user-1", "role": role }))
}

#[must_use]
pub fn store_with(token: Option<String>) -> Arc<TokenStore> {
    let storage = match token {
        Some(t) => MemoryStorage::with_token(t),
        None => MemoryStorage::new(),
    };
    Arc::new(TokenStore::init(storage))
}

// =============================================================================
// CLOCK
// =============================================================================

#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    #[must_use]
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn visits(&self) -> Vec<Route> {
        self.visits.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.visits.lock().unwrap().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        self.visits.lock().unwrap().push(route.clone());
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Replays queued outcomes in order and records every request it receives.
#[derive(Debug, Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: Result<ApiResponse, ApiError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn push_status(&self, status: u16, body: &Value) {
        self.push(Ok(ApiResponse::new(status, body.to_string())));
    }

    /// Queue a successful login/refresh response carrying `token`.
    pub fn push_token(&self, token: &str) {
        self.push_status(200, &json!({ "accessToken": token }));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of every request received, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no response queued".into())))
    }
}
