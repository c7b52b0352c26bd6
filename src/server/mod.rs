//! HTTP server for the message inbox.
//!
//! This module implements the HTTP surface that:
//! - Accepts signed webhook deliveries and records them idempotently
//! - Serves paginated, filterable queries over the recorded messages
//! - Exposes aggregate statistics, health probes, and metrics
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts provider deliveries (200 for new and duplicate)
//! - `GET /messages` - Paginated listing with `limit`, `offset`, `from`, `since`, `q`
//! - `GET /stats` - Total count and top senders by volume
//! - `GET /health/live` / `GET /health/ready` - Probes
//! - `GET /metrics` - Prometheus text exposition

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::query::PageLimits;
use crate::store::MessageStore;

pub mod health;
pub mod messages;
pub mod metrics;
pub mod stats;
pub mod webhook;

pub use health::{live_handler, ready_handler};
pub use messages::messages_handler;
pub use metrics::metrics_handler;
pub use stats::stats_handler;
pub use webhook::webhook_handler;

use webhook::WebhookLogContext;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It
/// carries the store handle, the webhook secret, pagination bounds, and
/// the metrics handle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Durable message storage.
    store: MessageStore,

    /// Shared secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    /// Bounds the query engine validates pagination against.
    page_limits: PageLimits,

    /// Process-wide metrics handle.
    metrics: Metrics,
}

impl AppState {
    /// Creates a new `AppState` with the given configuration.
    pub fn new(
        store: MessageStore,
        webhook_secret: impl Into<Vec<u8>>,
        page_limits: PageLimits,
        metrics: Metrics,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                store,
                webhook_secret: webhook_secret.into(),
                page_limits,
                metrics,
            }),
        }
    }

    /// Returns the store handle.
    pub fn store(&self) -> &MessageStore {
        &self.inner.store
    }

    /// Returns the webhook secret.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// Returns the pagination bounds.
    pub fn page_limits(&self) -> PageLimits {
        self.inner.page_limits
    }

    /// Returns the metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/messages", get(messages_handler))
        .route("/stats", get(stats_handler))
        .route("/health/live", get(live_handler))
        .route("/health/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            record_request,
        ))
        .with_state(app_state)
}

/// Request accounting middleware.
///
/// Emits one structured log record per request (request id, method,
/// path, status, latency) and feeds the HTTP counters. When the webhook
/// handler attached an outcome context to the response, its fields ride
/// along on the same record.
async fn record_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16();
    state.metrics().record_http_request(&path, status, latency_ms);

    let context = response.extensions().get::<WebhookLogContext>();
    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        latency_ms,
        result = context.map(|c| c.result),
        message_id = context.and_then(|c| c.message_id.as_ref()).map(|id| id.as_str()),
        dup = context.and_then(|c| c.dup),
        "request processed"
    );

    response
}
