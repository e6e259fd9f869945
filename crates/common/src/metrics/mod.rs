//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all HydraDoc metrics
pub const METRICS_PREFIX: &str = "hydradoc";

/// Histogram buckets for end-to-end query latency (in seconds), generation dominated
pub const QUERY_BUCKETS: &[f64] = &[
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    20.00, // 20s
    40.00, // 40s
    60.00, // 60s
];

/// Histogram buckets for retrieval latency (in seconds)
pub const RETRIEVAL_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    10.00, // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Query pipeline metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total queries by domain and outcome"
    );

    describe_histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end query latency in seconds"
    );

    describe_gauge!(
        format!("{}_query_confidence", METRICS_PREFIX),
        Unit::Count,
        "Expansion confidence of the last query per domain"
    );

    // Retrieval metrics
    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retriever latency in seconds"
    );

    describe_counter!(
        format!("{}_retriever_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Hybrid retrievals that ran with a single retriever"
    );

    describe_gauge!(
        format!("{}_fused_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of passages returned by fusion"
    );

    // Generation metrics
    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Answer generation latency in seconds"
    );

    describe_counter!(
        format!("{}_generation_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Generation calls including retries"
    );

    describe_counter!(
        format!("{}_generation_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Answers that failed after all attempts"
    );

    // Embedding metrics
    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    describe_counter!(
        format!("{}_embedding_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API errors"
    );

    // Index metrics
    describe_gauge!(
        format!("{}_indexed_passages", METRICS_PREFIX),
        Unit::Count,
        "Passages held by the in-memory index"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one finished query
pub fn record_query(duration_secs: f64, domain: &str, status: &str, confidence: f32) {
    counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        "domain" => domain.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_query_confidence", METRICS_PREFIX),
        "domain" => domain.to_string()
    )
    .set(confidence as f64);
}

/// Helper to record one retriever call
pub fn record_retrieval(duration_secs: f64, mode: &str, success: bool) {
    histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string(),
        "status" => if success { "success" } else { "error" }
    )
    .record(duration_secs);
}

/// Helper to record a single-retriever fallback
pub fn record_fallback(missing_mode: &str) {
    counter!(
        format!("{}_retriever_fallbacks_total", METRICS_PREFIX),
        "missing" => missing_mode.to_string()
    )
    .increment(1);
}

pub fn record_fusion(result_count: usize) {
    gauge!(format!("{}_fused_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record answer generation
pub fn record_generation(duration_secs: f64, model: &str, attempts: u32, success: bool) {
    counter!(
        format!("{}_generation_attempts_total", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .increment(attempts as u64);

    if success {
        histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_generation_failures_total", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .increment(1);
    }
}

/// Helper to record embedding metrics
pub fn record_embedding(duration_secs: f64, model: &str, batch_size: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_embedding_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
        tracing::trace!(model = model, batch_size = batch_size, "Embedding batch done");
    } else {
        counter!(
            format!("{}_embedding_errors_total", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .increment(1);
    }
}

pub fn record_index_size(passages: usize) {
    gauge!(format!("{}_indexed_passages", METRICS_PREFIX)).set(passages as f64);
}
