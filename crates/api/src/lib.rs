//! HTTP surface for the craftstats aggregation core.
//!
//! Thin glue: each route checks the shared TTL cache, calls into
//! `craftstats-core`, caches the JSON payload, and returns it. All domain
//! logic lives in the core crate.

pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;
