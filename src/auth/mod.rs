//! Token handling, session facts, and navigation guards.
//!
//! ARCHITECTURE
//! ============
//! `token` decodes claims, `store` owns the single token slot, `session`
//! answers questions about it, `gateway` talks to the auth endpoints, and
//! `guard` turns session facts into navigation decisions.

pub mod clock;
pub mod gateway;
pub mod guard;
pub mod session;
pub mod store;
pub mod token;
