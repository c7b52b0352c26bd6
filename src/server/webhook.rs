//! Webhook ingestion endpoint.
//!
//! Runs the ingestion pipeline for each delivery: verify the signature
//! over the raw bytes, parse and validate the payload, then attempt the
//! conditional insert and classify the result. Verification happens
//! before parsing and before any store access; an unauthenticated request
//! never reaches durable state.
//!
//! A retried delivery of an already-stored id is acknowledged exactly
//! like the original (HTTP 200), carrying a `duplicate` marker so the
//! two cases stay distinguishable in logs and metrics. Retries are the
//! sender's job; this endpoint only has to make them safe.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::signature::verify_signature;
use crate::store::{InsertOutcome, StoreError};
use crate::types::{MessageId, WebhookPayload};

/// Header carrying the hex-encoded HMAC-SHA256 of the request body.
const HEADER_SIGNATURE: &str = "x-signature";

/// Errors that terminate the ingestion pipeline.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature missing or wrong. The two cases are deliberately not
    /// distinguished anywhere the caller can observe.
    #[error("invalid signature")]
    Unauthorized,

    /// The body failed schema or format validation.
    #[error("{0}")]
    Malformed(String),

    /// The store could not perform the write.
    #[error("storage unavailable")]
    Store(#[from] StoreError),
}

impl WebhookError {
    /// Label used for the outcome metric and the request log.
    pub fn metric_label(&self) -> &'static str {
        match self {
            WebhookError::Unauthorized => "invalid_signature",
            WebhookError::Malformed(_) => "validation_error",
            WebhookError::Store(_) => "store_error",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage failures are surfaced generically; the underlying
        // error stays in the logs.
        let detail = match &self {
            WebhookError::Store(_) => "storage unavailable".to_string(),
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

/// Success classification of an accepted delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// First time this id was seen; a row was written.
    Created,

    /// The id was already stored; nothing was written.
    Duplicate,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestOutcome::Created => "created",
            IngestOutcome::Duplicate => "duplicate",
        }
    }
}

/// Per-request fields the logging middleware lifts off the response.
#[derive(Debug, Clone)]
pub struct WebhookLogContext {
    pub message_id: Option<MessageId>,
    pub result: &'static str,
    pub dup: Option<bool>,
}

/// Body of a successful acknowledgment.
#[derive(Debug, Serialize)]
struct IngestResponse {
    status: &'static str,
    result: &'static str,
}

/// `POST /webhook` handler.
///
/// Every terminal state of the pipeline — created, duplicate, rejected,
/// malformed, store failure — increments the outcome counter and attaches
/// a log context before the response leaves this function.
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = ingest(&state, &headers, &body).await;

    let context = WebhookLogContext {
        message_id: outcome.as_ref().ok().map(|(_, id)| id.clone()),
        result: match &outcome {
            Ok((classified, _)) => classified.as_str(),
            Err(err) => err.metric_label(),
        },
        dup: outcome
            .as_ref()
            .ok()
            .map(|(classified, _)| *classified == IngestOutcome::Duplicate),
    };
    state.metrics().record_webhook_outcome(context.result);

    let mut response = match outcome {
        Ok((classified, _)) => (
            StatusCode::OK,
            Json(IngestResponse {
                status: "ok",
                result: classified.as_str(),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    };
    response.extensions_mut().insert(context);
    response
}

/// The pipeline itself: `verify → parse → validate → insert → classify`.
async fn ingest(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(IngestOutcome, MessageId), WebhookError> {
    // Authenticate the exact bytes that arrived on the wire, before any
    // parsing. A missing header and a wrong digest take the same path.
    let supplied = headers
        .get(HEADER_SIGNATURE)
        .and_then(|value| value.to_str().ok());
    let verified = supplied
        .map(|signature| verify_signature(body, signature, state.webhook_secret()))
        .unwrap_or(false);
    if !verified {
        warn!("webhook rejected: signature verification failed");
        return Err(WebhookError::Unauthorized);
    }

    let payload: WebhookPayload = serde_json::from_slice(body)
        .map_err(|err| WebhookError::Malformed(err.to_string()))?;
    payload
        .validate()
        .map_err(|err| WebhookError::Malformed(err.to_string()))?;

    // The receive time is stamped here; on a duplicate the store keeps
    // the original row untouched, so the first stamp wins.
    let message = payload.into_message(Utc::now());
    let message_id = message.message_id.clone();

    match state.store().insert_if_absent(&message).await? {
        InsertOutcome::Inserted => {
            debug!(message_id = %message_id, "message stored");
            Ok((IngestOutcome::Created, message_id))
        }
        InsertOutcome::AlreadyExists => {
            debug!(message_id = %message_id, "duplicate delivery acknowledged");
            Ok((IngestOutcome::Duplicate, message_id))
        }
    }
}
