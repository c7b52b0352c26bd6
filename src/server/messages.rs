//! Paginated, filterable message listing.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use super::AppState;
use crate::query::{build_query, ListQuery, QueryError};
use crate::store::StoreError;
use crate::types::Message;

/// Errors that can occur while serving a listing.
#[derive(Debug, Error)]
pub enum MessagesError {
    /// A query parameter failed validation; the message names it.
    #[error(transparent)]
    Validation(#[from] QueryError),

    /// The store could not run the query.
    #[error("storage unavailable")]
    Store(#[from] StoreError),
}

impl IntoResponse for MessagesError {
    fn into_response(self) -> Response {
        let status = match &self {
            MessagesError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MessagesError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// One page of results plus the filter-wide total and the echoed
/// pagination parameters.
#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub data: Vec<Message>,

    /// Count of ALL rows matching the filter, not the page length.
    pub total: i64,

    pub limit: i64,
    pub offset: i64,
}

/// `GET /messages` handler.
///
/// Parameters: `limit`, `offset`, `from` (sender equality), `since`
/// (minimum receive time), `q` (substring match on the text body). All
/// supplied filters narrow the result (logical AND). Invalid parameters
/// are rejected with 422, never silently adjusted.
pub async fn messages_handler(
    State(state): State<AppState>,
    Query(raw): Query<ListQuery>,
) -> Result<Json<MessagePage>, MessagesError> {
    let (filter, page) = build_query(&raw, state.page_limits())?;

    let (data, total) = state.store().list(&filter, page.limit, page.offset).await?;

    Ok(Json(MessagePage {
        data,
        total,
        limit: page.limit,
        offset: page.offset,
    }))
}
