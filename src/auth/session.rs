//! Session facts derived from the stored token.
//!
//! SYSTEM CONTEXT
//! ==============
//! Nothing about the session is stored separately; every answer is
//! recomputed from the token slot and the clock at call time. A token that
//! fails to decode gives the most restrictive answer (logged out, expiring,
//! no role) and never an error.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use super::clock::Clock;
use super::store::TokenStore;
use super::token::{Claims, Role, decode_claims};

/// Seconds before `exp` at which a token counts as expiring soon.
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 300;

/// Read-only view over the token slot.
#[derive(Clone)]
pub struct SessionOracle {
    store: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    refresh_threshold_secs: i64,
}

impl SessionOracle {
    #[must_use]
    pub fn new(store: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock, refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS }
    }

    #[must_use]
    pub fn with_refresh_threshold(mut self, secs: i64) -> Self {
        self.refresh_threshold_secs = secs;
        self
    }

    #[must_use]
    pub fn refresh_threshold_secs(&self) -> i64 {
        self.refresh_threshold_secs
    }

    #[must_use]
    pub fn now_secs(&self) -> i64 {
        self.clock.now_secs()
    }

    /// Decoded claims of the stored token, `None` when absent or undecodable.
    #[must_use]
    pub fn claims(&self) -> Option<Claims> {
        let token = self.store.token()?;
        match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "stored token not decodable");
                None
            }
        }
    }

    /// A token exists, decodes, and its `exp` is still in the future.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.claims().is_some_and(|c| c.is_valid_at(self.now_secs()))
    }

    /// True unless a decodable token has more than the threshold left.
    #[must_use]
    pub fn is_expiring_soon(&self) -> bool {
        let now = self.now_secs();
        self.claims()
            .and_then(|c| c.seconds_remaining(now))
            .map_or(true, |left| left < self.refresh_threshold_secs)
    }

    /// Normalized role, [`Role::Unknown`] when absent.
    #[must_use]
    pub fn role(&self) -> Role {
        self.claims().map_or(Role::Unknown, |c| c.role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// `sub`, falling back to `userId`.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.claims()?.subject
    }

    /// Raw `exp` of the stored token.
    #[must_use]
    pub fn expiration_time(&self) -> Option<i64> {
        self.claims()?.exp
    }

    /// Seconds until `exp`; negative once expired.
    #[must_use]
    pub fn seconds_remaining(&self) -> Option<i64> {
        self.claims()?.seconds_remaining(self.now_secs())
    }

    /// Identity snapshot used for per-record permission checks.
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        let claims = self.claims().unwrap_or_default();
        Viewer { user_id: claims.subject, role: claims.role }
    }
}

/// Who is looking at a record, as far as the token says.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub role: Role,
}

impl Viewer {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
