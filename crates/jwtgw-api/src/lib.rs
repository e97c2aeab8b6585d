//! # jwtgw-api — Axum Gateway Front
//!
//! Serves the bearer-token filter over HTTP: every protected route sits
//! behind [`auth::auth_middleware`], which admits a request only when its
//! token verifies (JWS) or decrypts (JWE) under the loaded keys.
//!
//! ## API Surface
//!
//! | Path                 | Auth     | Module                 |
//! |----------------------|----------|------------------------|
//! | `/health/liveness`   | none     | this module            |
//! | `/health/readiness`  | none     | this module            |
//! | `/metrics`           | none     | this module (optional) |
//! | `/api/ping`          | bearer   | [`routes::ping`]       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! The metrics middleware is mounted only when metrics are enabled. Auth
//! applies to protected routes only.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware so
/// they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    // route_layer: unmatched paths fall through to 404, not 401.
    let protected = routes::ping::router()
        .route_layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    let mut unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));
    if state.metrics_enabled {
        unauthenticated = unauthenticated.route("/metrics", get(prometheus_metrics));
    }

    let mut router = Router::new().merge(unauthenticated).merge(protected);
    if state.metrics_enabled {
        router = router
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(state.metrics.clone()));
    }

    router
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// GET /metrics: Prometheus scrape endpoint in text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => AppError::Internal(e).into_response(),
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Key material is loaded before the router exists, so a
/// running router is a ready one.
async fn readiness() -> &'static str {
    "ready"
}
