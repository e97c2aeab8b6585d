//! # Ping
//!
//! `GET /api/ping` answers with the server's local time and `"pong"`. It is
//! the protected downstream used to observe the filter end to end.

use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Response body for `GET /api/ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Server local time, without offset.
    pub timestamp: NaiveDateTime,
    pub message: String,
}

/// Build the ping router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/ping", get(ping))
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        timestamp: chrono::Local::now().naive_local(),
        message: "pong".to_string(),
    })
}
