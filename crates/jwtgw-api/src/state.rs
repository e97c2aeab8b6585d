//! # Application State
//!
//! Shared state for the Axum application, passed to the auth middleware and
//! route handlers via the `State` extractor.
//!
//! Holds no mutable state. The key material is immutable after startup and
//! the metrics handles are internally synchronized.

use std::sync::Arc;

use jwtgw_crypto::KeyMaterial;

use crate::auth::AuthenticationFilter;
use crate::error::StartupError;
use crate::middleware::metrics::GatewayMetrics;

/// Cheaply cloneable application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub filter: AuthenticationFilter,
    pub metrics: GatewayMetrics,
    /// Whether `/metrics` is mounted and HTTP requests are counted.
    pub metrics_enabled: bool,
}

impl AppState {
    /// Build state around loaded keys with a fresh metrics registry.
    pub fn new(keys: KeyMaterial, metrics_enabled: bool) -> Result<Self, StartupError> {
        Ok(Self {
            filter: AuthenticationFilter::new(Arc::new(keys)),
            metrics: GatewayMetrics::new()?,
            metrics_enabled,
        })
    }
}
