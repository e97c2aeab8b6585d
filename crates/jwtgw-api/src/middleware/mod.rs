//! # Middleware
//!
//! - `metrics`: Prometheus counters for requests and auth decisions.
//! - `tracing_layer`: `TraceLayer` configuration.
//!
//! The bearer-token middleware lives in [`crate::auth`].

pub mod metrics;
pub mod tracing_layer;
