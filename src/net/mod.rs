//! Networking modules for the REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` moves bytes, `interceptor` owns bearer/refresh/retry policy,
//! `api` wraps the deal and user endpoints, and `models` defines their
//! payloads.

pub mod api;
pub mod endpoints;
pub mod interceptor;
pub mod models;
pub mod transport;
pub mod types;
