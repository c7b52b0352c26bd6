//! Liveness and readiness probes.
//!
//! Liveness answers "is the process serving requests" and is
//! unconditional. Readiness additionally checks that the database
//! answers a probe query, so an orchestrator stops routing traffic to an
//! instance whose storage is gone. Neither probe touches business logic.

use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;

/// `GET /health/live` handler.
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// `GET /health/ready` handler.
///
/// 200 when the store answers, 503 otherwise.
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
