//! Fetch metrics.
//!
//! # Metrics
//! - `cloudworker_fetch_requests_total` (counter): completed fetches by method, status
//! - `cloudworker_fetch_errors_total` (counter): failed fetches by method
//! - `cloudworker_fetch_duration_seconds` (histogram): dispatch latency

use std::time::Instant;

/// Record a fetch that produced a response.
pub fn record_fetch(method: &str, status: u16, start_time: Instant) {
    metrics::counter!(
        "cloudworker_fetch_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("cloudworker_fetch_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a fetch that failed before a response existed.
pub fn record_fetch_error(method: &str) {
    metrics::counter!("cloudworker_fetch_errors_total", "method" => method.to_string())
        .increment(1);
}
