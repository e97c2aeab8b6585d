//! # Prometheus Metrics
//!
//! Authentication outcomes and HTTP request counts, exported through a
//! `prometheus` registry.
//!
//! | Metric                              | Labels               |
//! |-------------------------------------|----------------------|
//! | `jwtgw_auth_decisions_total`        | `decision`, `reason` |
//! | `jwtgw_auth_verification_seconds`   | `kind`               |
//! | `jwtgw_http_requests_total`         | `method`, `status`   |
//!
//! Every label value comes from a closed set, so cardinality is bounded.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct GatewayMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    auth_decisions_total: IntCounterVec,
    auth_verification_seconds: HistogramVec,
    http_requests_total: IntCounterVec,
}

impl std::fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMetrics")
            .field("admitted", &self.decisions("admit"))
            .field("denied", &self.decisions("deny"))
            .field("requests", &self.requests())
            .finish()
    }
}

impl GatewayMetrics {
    /// Create a new metrics instance with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let auth_decisions_total = IntCounterVec::new(
            Opts::new(
                "jwtgw_auth_decisions_total",
                "Authentication decisions by outcome and reason",
            ),
            &["decision", "reason"],
        )?;

        // Verification is microseconds to low milliseconds.
        let auth_verification_seconds = HistogramVec::new(
            HistogramOpts::new(
                "jwtgw_auth_verification_seconds",
                "Time spent verifying or decrypting a token",
            )
            .buckets(vec![
                0.000_05, 0.000_1, 0.000_25, 0.000_5, 0.001, 0.002_5, 0.005, 0.01, 0.025,
            ]),
            &["kind"],
        )?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("jwtgw_http_requests_total", "Total HTTP requests"),
            &["method", "status"],
        )?;

        registry.register(Box::new(auth_decisions_total.clone()))?;
        registry.register(Box::new(auth_verification_seconds.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                auth_decisions_total,
                auth_verification_seconds,
                http_requests_total,
            }),
        })
    }

    /// Count one authentication decision.
    pub fn record_decision(&self, decision: &str, reason: &str) {
        self.inner
            .auth_decisions_total
            .with_label_values(&[decision, reason])
            .inc();
    }

    /// Record how long one verification took. `kind` is `jws` or `jwe`.
    pub fn observe_verification(&self, kind: &str, seconds: f64) {
        self.inner
            .auth_verification_seconds
            .with_label_values(&[kind])
            .observe(seconds);
    }

    fn record_request(&self, method: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    /// Total decisions with the given `decision` label, across all reasons.
    pub fn decisions(&self, decision: &str) -> u64 {
        sum_where(&self.inner.auth_decisions_total, "decision", decision)
    }

    /// Total decisions with the given `reason` label.
    pub fn decisions_for_reason(&self, reason: &str) -> u64 {
        sum_where(&self.inner.auth_decisions_total, "reason", reason)
    }

    /// Total HTTP requests across all labels.
    pub fn requests(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_requests_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

/// Sum a counter vector over series whose `label` equals `value`.
fn sum_where(counters: &IntCounterVec, label: &str, value: &str) -> u64 {
    let mut total = 0u64;
    for mf in &counters.collect() {
        for m in mf.get_metric() {
            let matches = m
                .get_label()
                .iter()
                .any(|pair| pair.get_name() == label && pair.get_value() == value);
            if matches {
                total += m.get_counter().get_value() as u64;
            }
        }
    }
    total
}

/// Middleware that counts HTTP requests by method and status.
///
/// Expects a [`GatewayMetrics`] request extension; passes through untouched
/// when none is installed.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<GatewayMetrics>().cloned();
    let method = request.method().to_string();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(&method, response.status().as_u16());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_metrics_start_at_zero() {
        let m = GatewayMetrics::new().unwrap();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.decisions("admit"), 0);
        assert_eq!(m.decisions("deny"), 0);
    }

    #[test]
    fn decisions_are_counted_by_label() {
        let m = GatewayMetrics::new().unwrap();
        m.record_decision("admit", "ok_hs256");
        m.record_decision("admit", "ok_jwe");
        m.record_decision("deny", "signature_invalid");
        m.record_decision("deny", "signature_invalid");
        m.record_decision("deny", "decryption_failed");

        assert_eq!(m.decisions("admit"), 2);
        assert_eq!(m.decisions("deny"), 3);
        assert_eq!(m.decisions_for_reason("signature_invalid"), 2);
        assert_eq!(m.decisions_for_reason("unsupported_algorithm"), 0);
    }

    #[test]
    fn requests_increment() {
        let m = GatewayMetrics::new().unwrap();
        m.record_request("GET", 200);
        m.record_request("GET", 401);
        m.record_request("POST", 404);
        assert_eq!(m.requests(), 3);
    }

    #[test]
    fn encoded_output_contains_metric_names() {
        let m = GatewayMetrics::new().unwrap();
        m.record_decision("deny", "missing_or_malformed_header");
        m.observe_verification("jws", 0.0002);
        m.record_request("GET", 401);

        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("jwtgw_auth_decisions_total"));
        assert!(text.contains(r#"reason="missing_or_malformed_header""#));
        assert!(text.contains("jwtgw_auth_verification_seconds_bucket"));
        assert!(text.contains(r#"jwtgw_http_requests_total{method="GET",status="401"} 1"#));
    }

    #[test]
    fn clones_share_registry() {
        let m = GatewayMetrics::new().unwrap();
        let clone = m.clone();
        clone.record_decision("admit", "ok_es256");
        assert_eq!(m.decisions("admit"), 1);
    }
}
