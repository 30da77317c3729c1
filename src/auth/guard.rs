//! Navigation guards built on the session oracle.
//!
//! Both guards are synchronous and only touch the token slot to clear a
//! token that is no longer valid. They decide routing; they are not an
//! access-control boundary.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use std::sync::Arc;

use super::session::SessionOracle;
use super::store::TokenStore;
use crate::routes::{Navigator, Route};

/// Outcome of a guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Navigation denied; the guard already sent the user here.
    Redirect(Route),
}

impl GuardDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Shared invalid-token handling for both guards.
fn require_session(oracle: &SessionOracle, store: &TokenStore, navigator: &dyn Navigator) -> GuardDecision {
    if oracle.is_logged_in() {
        return GuardDecision::Allow;
    }
    tracing::debug!("no valid session; redirecting to login");
    store.clear();
    navigator.navigate(&Route::Login);
    GuardDecision::Redirect(Route::Login)
}

/// Allows navigation only with a valid, unexpired token.
#[derive(Clone)]
pub struct AuthGuard {
    oracle: SessionOracle,
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthGuard {
    #[must_use]
    pub fn new(oracle: SessionOracle, store: Arc<TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { oracle, store, navigator }
    }

    #[must_use]
    pub fn check(&self) -> GuardDecision {
        require_session(&self.oracle, &self.store, self.navigator.as_ref())
    }
}

/// Allows navigation only for a valid admin session.
#[derive(Clone)]
pub struct RoleGuard {
    oracle: SessionOracle,
    store: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl RoleGuard {
    #[must_use]
    pub fn new(oracle: SessionOracle, store: Arc<TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { oracle, store, navigator }
    }

    #[must_use]
    pub fn check(&self) -> GuardDecision {
        let session = require_session(&self.oracle, &self.store, self.navigator.as_ref());
        if !session.is_allowed() {
            return session;
        }
        if self.oracle.is_admin() {
            return GuardDecision::Allow;
        }
        tracing::debug!(role = %self.oracle.role(), "admin route denied");
        self.navigator.navigate(&Route::Deals);
        GuardDecision::Redirect(Route::Deals)
    }
}
