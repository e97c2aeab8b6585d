//! # API Error Types
//!
//! [`AppError`] is the per-request error surface and implements
//! `axum::response::IntoResponse`. [`StartupError`] covers everything that
//! can stop the gateway before it binds a socket.
//!
//! A 401 never carries a body. The caller learns only that the token was
//! not accepted; the reason goes to logs and metrics.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use jwtgw_core::KeyLoadError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body, used for 5xx responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "INTERNAL_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error that renders as an HTTP response.
#[derive(Error, Debug)]
pub enum AppError {
    /// Token missing, malformed, unverifiable, or undecryptable (401).
    #[error("unauthorized")]
    Unauthorized,

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
            )
                .into_response(),
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                let body = ErrorBody {
                    error: ErrorDetail {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal error occurred".to_string(),
                    },
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Failure before the server starts accepting traffic. Always fatal.
#[derive(Error, Debug)]
pub enum StartupError {
    /// An environment variable held an unusable value.
    #[error("invalid configuration: {var}: {reason}")]
    Config {
        /// Variable name.
        var: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// A key slot failed to load.
    #[error(transparent)]
    Keys(#[from] KeyLoadError),

    /// The metrics registry rejected a collector.
    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use jwtgw_core::KeySlot;

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn unauthorized_is_401_with_challenge_and_empty_body() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn internal_error_hides_message() {
        let response = AppError::Internal("registry poisoned".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("registry poisoned"));
    }

    #[test]
    fn startup_error_passes_key_errors_through() {
        let err: StartupError = KeyLoadError::Missing {
            key: KeySlot::Hs256Secret,
        }
        .into();
        assert!(err.to_string().contains("HS256_SECRET_FILE"));
    }

    #[test]
    fn config_error_names_variable() {
        let err = StartupError::Config {
            var: "PORT",
            reason: "not a number".into(),
        };
        assert_eq!(err.to_string(), "invalid configuration: PORT: not a number");
    }
}
