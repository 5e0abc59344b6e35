//! Beacon - demo HTTP service with real-time push
//!
//! A small axum service with a handful of independent demo endpoints and one
//! piece of real machinery: messages published on a Redis pub/sub topic are
//! fanned out to every connected WebSocket client.
//!
//! ## Features
//!
//! - Templated greeting page, Fibonacci, Redis lookup with default fallback
//! - Health, version and Prometheus metrics endpoints
//! - Redis pub/sub → WebSocket broadcast with dead-peer pruning
//! - Degrades cleanly when Redis is unreachable

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod realtime;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use metrics::Metrics;
pub use store::StoreHandle;
