//! # Bearer-Token Authentication
//!
//! The gateway's one access decision: is the `Authorization` header a
//! bearer token that verifies (JWS) or decrypts (JWE) under the configured
//! keys?
//!
//! ## Flow
//!
//! ```text
//! Authorization header
//!   └─ "Bearer " prefix? ── no ──────────────────────────► Deny
//!        └─ classify(token)
//!             ├─ 3 segments ─► jws::verify ── err ───────► Deny
//!             └─ otherwise ──► jwe::decrypt ─ err ───────► Deny
//!                                 └─ ok ─────────────────► Admit
//! ```
//!
//! ## Uniform Failure
//!
//! [`AuthenticationFilter::check`] keeps the cause of a failure so it can be
//! logged and counted. [`auth_middleware`] turns every failure into the same
//! bodiless 401; nothing about the cause reaches the caller.
//!
//! ## Verification Cost
//!
//! Verification is synchronous, CPU-bound, and bounded (one signature check
//! or one RSA decryption plus one AES-GCM open). It runs inline on the
//! request task. [`KeyMaterial`] is immutable and shared by `Arc`, so
//! concurrent requests never contend.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jwtgw_core::{classify, AuthError, JwsAlgorithm, TokenKind};
use jwtgw_crypto::{jwe, jws, KeyMaterial};

use crate::error::AppError;
use crate::state::AppState;

/// Case-sensitive scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

// ── Decision ────────────────────────────────────────────────────────────────

/// The only externally observable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request unchanged.
    Admit,
    /// Reject with 401.
    Deny,
}

impl Decision {
    /// Return the string representation of this decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admit => "admit",
            Self::Deny => "deny",
        }
    }
}

/// How a token was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verified {
    /// Signature verified with the given algorithm.
    Signed(JwsAlgorithm),
    /// Decrypted and tag-verified.
    Encrypted,
}

impl Verified {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Signed(JwsAlgorithm::Hs256) => "ok_hs256",
            Self::Signed(JwsAlgorithm::Rs256) => "ok_rs256",
            Self::Signed(JwsAlgorithm::Es256) => "ok_es256",
            // jws::verify never returns Unsupported.
            Self::Signed(JwsAlgorithm::Unsupported(_)) => "ok_jws",
            Self::Encrypted => "ok_jwe",
        }
    }
}

// ── Filter ──────────────────────────────────────────────────────────────────

/// Per-request authentication against a fixed key set.
///
/// Cheap to clone; holds no per-request state.
#[derive(Debug, Clone)]
pub struct AuthenticationFilter {
    keys: Arc<KeyMaterial>,
}

impl AuthenticationFilter {
    /// Wrap loaded key material.
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        Self { keys }
    }

    /// Check the request headers, keeping the failure cause.
    pub fn check(&self, headers: &HeaderMap) -> Result<Verified, AuthError> {
        let token = extract_bearer(headers.get(header::AUTHORIZATION))?;
        self.verify_token(token)
    }

    /// Verify a bare compact token, as it appears after `Bearer `.
    pub fn verify_token(&self, token: &str) -> Result<Verified, AuthError> {
        match classify(token) {
            TokenKind::Signed(signed) => Ok(Verified::Signed(jws::verify(&signed, &self.keys)?)),
            TokenKind::Encrypted(encrypted) => {
                jwe::decrypt(&encrypted, &self.keys)?;
                Ok(Verified::Encrypted)
            }
        }
    }

    /// Check the request headers and collapse the result to a [`Decision`].
    pub fn authenticate(&self, headers: &HeaderMap) -> Decision {
        match self.check(headers) {
            Ok(_) => Decision::Admit,
            Err(_) => Decision::Deny,
        }
    }
}

/// Pull the compact token out of an `Authorization` header value.
///
/// The value must be visible ASCII and start with exactly `"Bearer "`.
/// Nothing after the prefix is trimmed or validated here.
pub fn extract_bearer(value: Option<&HeaderValue>) -> Result<&str, AuthError> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingOrMalformedHeader)
}

/// Which verification path a result went through, if any.
fn verification_kind(outcome: &Result<Verified, AuthError>) -> Option<&'static str> {
    match outcome {
        Ok(Verified::Signed(_)) | Err(AuthError::Signature(_)) => Some("jws"),
        Ok(Verified::Encrypted) | Err(AuthError::Decryption(_)) => Some("jwe"),
        Err(AuthError::MissingOrMalformedHeader) => None,
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Admit or reject the request before it reaches any protected route.
///
/// On admit the request is forwarded unmodified. On deny the response is
/// `401` with `WWW-Authenticate: Bearer` and an empty body, and the inner
/// service is never called.
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let outcome = state.filter.check(request.headers());
    if let Some(kind) = verification_kind(&outcome) {
        state
            .metrics
            .observe_verification(kind, started.elapsed().as_secs_f64());
    }

    match outcome {
        Ok(verified) => {
            let reason = verified.reason();
            tracing::debug!(reason, "bearer token accepted");
            state.metrics.record_decision(Decision::Admit.as_str(), reason);
            next.run(request).await
        }
        Err(err) => {
            let reason = err.reason();
            match err {
                AuthError::MissingOrMalformedHeader => {
                    tracing::debug!(reason, "authentication failed: no bearer token")
                }
                _ => tracing::warn!(reason, "authentication failed: token rejected"),
            }
            state.metrics.record_decision(Decision::Deny.as_str(), reason);
            AppError::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use jwtgw_core::{DecryptionError, SignatureError};
    use jwtgw_crypto::fixtures::FixtureKeys;
    use serde_json::json;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let keys = FixtureKeys::shared().key_material();
        AppState::new(keys, true).unwrap()
    }

    /// Build a minimal router with the auth middleware and a simple handler.
    fn test_app(state: AppState) -> Router {
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        headers
    }

    fn claims() -> serde_json::Value {
        json!({"sub": "x"})
    }

    // ── extract_bearer ──────────────────────────────────────────────

    #[test]
    fn extract_bearer_strips_prefix() {
        let value = HeaderValue::from_static("Bearer a.b.c");
        assert_eq!(extract_bearer(Some(&value)), Ok("a.b.c"));
    }

    #[test]
    fn extract_bearer_rejects_missing_header() {
        assert_eq!(
            extract_bearer(None),
            Err(AuthError::MissingOrMalformedHeader)
        );
    }

    #[test]
    fn extract_bearer_is_case_sensitive() {
        for raw in ["bearer a.b.c", "BEARER a.b.c", "Bearer", "Bearera.b.c", "Basic dXNlcjpwYXNz"] {
            let value = HeaderValue::from_str(raw).unwrap();
            assert_eq!(
                extract_bearer(Some(&value)),
                Err(AuthError::MissingOrMalformedHeader),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn extract_bearer_rejects_non_ascii() {
        let value = HeaderValue::from_bytes(b"Bearer \xe2\x82\xac").unwrap();
        assert_eq!(
            extract_bearer(Some(&value)),
            Err(AuthError::MissingOrMalformedHeader)
        );
    }

    #[test]
    fn extract_bearer_keeps_empty_token() {
        let value = HeaderValue::from_static("Bearer ");
        assert_eq!(extract_bearer(Some(&value)), Ok(""));
    }

    // ── AuthenticationFilter ────────────────────────────────────────

    #[test]
    fn check_reports_algorithm() {
        let state = test_state();
        let fixture = FixtureKeys::shared();
        for (alg, reason) in [("HS256", "ok_hs256"), ("RS256", "ok_rs256"), ("ES256", "ok_es256")] {
            let token = fixture.sign(alg, &claims());
            let verified = state.filter.check(&headers(&format!("Bearer {token}"))).unwrap();
            assert_eq!(verified.reason(), reason);
        }
    }

    #[test]
    fn check_accepts_jwe() {
        let state = test_state();
        let token = FixtureKeys::shared().encrypt("RSA-OAEP", "A256GCM", &claims());
        let verified = state.filter.check(&headers(&format!("Bearer {token}"))).unwrap();
        assert_eq!(verified, Verified::Encrypted);
    }

    #[test]
    fn check_distinguishes_failures() {
        let state = test_state();
        let fixture = FixtureKeys::shared();

        assert_eq!(
            state.filter.check(&HeaderMap::new()),
            Err(AuthError::MissingOrMalformedHeader)
        );

        let none = fixture.sign("none", &claims());
        assert_eq!(
            state.filter.check(&headers(&format!("Bearer {none}"))),
            Err(SignatureError::UnsupportedAlgorithm("none".into()).into())
        );

        assert_eq!(
            state.filter.check(&headers("Bearer a.b.c.d")),
            Err(DecryptionError::DecryptionFailed.into())
        );
    }

    #[test]
    fn authenticate_collapses_to_decision() {
        let state = test_state();
        let token = FixtureKeys::shared().sign("HS256", &claims());
        assert_eq!(
            state.filter.authenticate(&headers(&format!("Bearer {token}"))),
            Decision::Admit
        );
        assert_eq!(state.filter.authenticate(&HeaderMap::new()), Decision::Deny);
        assert_eq!(
            state.filter.authenticate(&headers("Bearer garbage")),
            Decision::Deny
        );
    }

    #[test]
    fn verification_kind_follows_path() {
        assert_eq!(verification_kind(&Ok(Verified::Encrypted)), Some("jwe"));
        assert_eq!(
            verification_kind(&Err(SignatureError::SignatureInvalid.into())),
            Some("jws")
        );
        assert_eq!(
            verification_kind(&Err(AuthError::MissingOrMalformedHeader)),
            None
        );
    }

    // ── Middleware ──────────────────────────────────────────────────

    #[tokio::test]
    async fn valid_bearer_token_accepted() {
        let state = test_state();
        let token = FixtureKeys::shared().sign("ES256", &claims());
        let app = test_app(state.clone());

        let request = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
        assert_eq!(state.metrics.decisions_for_reason("ok_es256"), 1);
    }

    #[tokio::test]
    async fn missing_authorization_header_rejected() {
        let state = test_state();
        let app = test_app(state.clone());

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(
            state.metrics.decisions_for_reason("missing_or_malformed_header"),
            1
        );
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let app = test_app(test_state());

        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejection_body_does_not_reveal_reason() {
        let fixture = FixtureKeys::shared();
        let tokens = [
            fixture.sign("none", &claims()),
            fixture.sign_hs256_with_secret(&[1u8; 32], &claims()),
            "a.b.c.d".to_string(),
            "not-base64!.x.y".to_string(),
        ];

        for token in tokens {
            let request = Request::builder()
                .uri("/test")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();
            let response = test_app(test_state()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(response.headers().get(header::CONTENT_TYPE).is_none());
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn deny_reasons_are_counted() {
        let state = test_state();
        let fixture = FixtureKeys::shared();
        let cases = [
            (fixture.sign("HS512", &claims()), "unsupported_algorithm"),
            (fixture.sign_hs256_with_secret(&[9u8; 32], &claims()), "signature_invalid"),
            ("e30.e30.!!".to_string(), "malformed_token"),
            ("only-one-segment".to_string(), "decryption_failed"),
        ];

        for (token, _) in &cases {
            let request = Request::builder()
                .uri("/test")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();
            let response = test_app(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        for (_, reason) in cases {
            assert_eq!(state.metrics.decisions_for_reason(reason), 1, "{reason}");
        }
        assert_eq!(state.metrics.decisions("deny"), 4);
        assert_eq!(state.metrics.decisions("admit"), 0);
    }
}
