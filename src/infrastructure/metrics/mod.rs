//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Messages created
//! - Deliveries by outcome (pushed, dropped, offline)
//! - Live gateway sessions

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "chat_hub";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds")
            .namespace(NAMESPACE)
            .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Messages stored
pub static MESSAGES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("messages_created_total", "Total number of messages created").namespace(NAMESPACE),
    )
    .expect("Failed to create MESSAGES_CREATED_TOTAL metric")
});

/// Delivery attempts by outcome
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("deliveries_total", "Message deliveries handed to the gateway").namespace(NAMESPACE),
        &["outcome"], // "pushed", "dropped", "offline"
    )
    .expect("Failed to create DELIVERIES_TOTAL metric")
});

/// Identified gateway sessions
pub static GATEWAY_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("gateway_sessions_active", "Number of identified gateway sessions").namespace(NAMESPACE),
    )
    .expect("Failed to create GATEWAY_SESSIONS_ACTIVE metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(MESSAGES_CREATED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_CREATED_TOTAL");
    registry
        .register(Box::new(DELIVERIES_TOTAL.clone()))
        .expect("Failed to register DELIVERIES_TOTAL");
    registry
        .register(Box::new(GATEWAY_SESSIONS_ACTIVE.clone()))
        .expect("Failed to register GATEWAY_SESSIONS_ACTIVE");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to count a stored message
pub fn record_message_created() {
    MESSAGES_CREATED_TOTAL.inc();
}

/// Helper to count a delivery attempt
pub fn record_delivery(outcome: &str) {
    DELIVERIES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper to update the gateway session count
pub fn set_gateway_sessions(count: usize) {
    GATEWAY_SESSIONS_ACTIVE.set(count as i64);
}
