//! Prometheus metrics.
//!
//! A [`Metrics`] handle owns a private registry and is constructed once at
//! startup, then carried in the shared application state. Handlers write
//! through the handle after each outcome is decided; the `/metrics`
//! endpoint reads the same handle. Keeping the registry on the handle
//! (instead of process globals) lets tests build isolated instances.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Latency buckets in milliseconds. Plus the implicit +Inf bucket.
const LATENCY_BUCKETS_MS: &[f64] = &[100.0, 500.0];

/// Process-wide metrics handle. Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    webhook_outcomes: IntCounterVec,
    request_latency: Histogram,
}

impl Metrics {
    /// Builds the registry and registers every collector.
    ///
    /// Metric definitions are static, so registration can only fail on a
    /// programming error (duplicate name); that is a panic, not a
    /// recoverable condition.
    pub fn new() -> Metrics {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["path", "status"],
        )
        .expect("metric definition");
        registry
            .register(Box::new(http_requests.clone()))
            .expect("metric registration");

        let webhook_outcomes = IntCounterVec::new(
            Opts::new("webhook_requests_total", "Webhook processing outcomes"),
            &["result"],
        )
        .expect("metric definition");
        registry
            .register(Box::new(webhook_outcomes.clone()))
            .expect("metric registration");

        let request_latency = Histogram::with_opts(
            HistogramOpts::new("request_latency_ms", "Request latency in ms")
                .buckets(LATENCY_BUCKETS_MS.to_vec()),
        )
        .expect("metric definition");
        registry
            .register(Box::new(request_latency.clone()))
            .expect("metric registration");

        Metrics {
            registry,
            http_requests,
            webhook_outcomes,
            request_latency,
        }
    }

    /// Records one finished HTTP request.
    pub fn record_http_request(&self, path: &str, status: u16, latency_ms: f64) {
        self.http_requests
            .with_label_values(&[path, &status.to_string()])
            .inc();
        self.request_latency.observe(latency_ms);
    }

    /// Records one classified webhook outcome
    /// (`created`, `duplicate`, `invalid_signature`, `validation_error`,
    /// `store_error`).
    pub fn record_webhook_outcome(&self, result: &str) {
        self.webhook_outcomes.with_label_values(&[result]).inc();
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        // Encoding into a Vec cannot fail for well-formed metric families.
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .expect("text encoding");
        String::from_utf8(buffer).expect("prometheus text format is UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics::new()
    }
}
