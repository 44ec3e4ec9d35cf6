//! Metrics collection and exposition.
//!
//! # Metrics
//! - `custody_passthrough_total` (counter): calls forwarded untouched
//! - `custody_submissions_total` (counter): submissions sent to custody
//! - `custody_outcomes_total` (counter): terminal states, by `state`
//! - `custody_poll_errors_total` (counter): failed status polls
//! - `custody_wait_seconds` (histogram): local wait per submission

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::signer::SubmissionState;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_pass_through() {
    metrics::counter!("custody_passthrough_total").increment(1);
}

pub fn record_submission() {
    metrics::counter!("custody_submissions_total").increment(1);
}

pub fn record_outcome(state: SubmissionState, waited: Duration) {
    metrics::counter!("custody_outcomes_total", "state" => state.as_str()).increment(1);
    metrics::histogram!("custody_wait_seconds").record(waited.as_secs_f64());
}

pub fn record_poll_error() {
    metrics::counter!("custody_poll_errors_total").increment(1);
}
