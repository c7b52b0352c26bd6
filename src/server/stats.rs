//! Aggregate statistics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use super::AppState;
use crate::config::TOP_SENDERS;
use crate::store::StoreError;

/// Errors that can occur while computing stats.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("storage unavailable")]
    Store(#[from] StoreError),
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

/// The aggregate view over the whole store.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_messages: i64,
    pub senders_count: i64,
    pub messages_per_sender: Vec<SenderEntry>,
    pub first_message_ts: Option<String>,
    pub last_message_ts: Option<String>,
}

/// One sender with its message count.
#[derive(Debug, Serialize)]
pub struct SenderEntry {
    #[serde(rename = "from")]
    pub sender: String,
    pub count: i64,
}

/// `GET /stats` handler.
///
/// Top senders are ordered by count descending with ties broken by
/// sender ascending, truncated to the configured size.
pub async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, StatsError> {
    let summary = state.store().count_and_top_senders(TOP_SENDERS).await?;

    Ok(Json(StatsResponse {
        total_messages: summary.total,
        senders_count: summary.senders,
        messages_per_sender: summary
            .top_senders
            .into_iter()
            .map(|entry| SenderEntry {
                sender: entry.sender,
                count: entry.count,
            })
            .collect(),
        first_message_ts: summary.first_ts,
        last_message_ts: summary.last_ts,
    }))
}
