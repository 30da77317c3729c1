//! Client session library for the deal-pipeline tracker.
//!
//! SYSTEM CONTEXT
//! ==============
//! The REST backend issues signed bearer tokens. This crate keeps the one
//! token the client holds, reads its claims for routing decisions, refreshes
//! it ahead of expiry, retries once on a 401, and gates navigation by role.
//! Deal and user endpoints are thin wrappers over the authenticated client.
//!
//! Client-side claim decoding never checks the signature. It drives UX and
//! routing only; the server re-validates every request.
//!
//! FEATURES
//! ========
//! - `native` (default): `reqwest` transport and file-backed token storage.
//! - `hydrate`: browser transport via `gloo-net`, `localStorage` token slot,
//!   and `window.location` navigation.

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod net;
pub mod routes;

#[cfg(test)]
pub mod test_helpers;

pub use auth::gateway::{AuthGateway, AuthPhase, Credentials, LoginFailure};
pub use auth::guard::{AuthGuard, GuardDecision, RoleGuard};
pub use auth::session::SessionOracle;
pub use auth::store::{MemoryStorage, TokenStorage, TokenStore};
pub use auth::token::{Claims, DecodeError, Role, decode_claims};
pub use config::{ClientConfig, ConfigError};
pub use context::SessionContext;
pub use error::ApiError;
pub use net::interceptor::ApiClient;
pub use routes::{AppRouter, Navigator, Route};
