//! Self-telemetry for the toolkit, exported in prometheus text format on
//! `/internal/metrics`. These describe the toolkit itself, not the synthetic
//! readings it serves on `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Encoder, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    TextEncoder,
};
use std::time::Instant;

use crate::Result;

lazy_static! {
    // HTTP metrics
    pub static ref HTTP_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests by method, path and status",
        &["method", "path", "status"]
    ).unwrap();

    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "Duration of HTTP requests in seconds",
        &["method", "path"]
    ).unwrap();

    // Collection metrics
    pub static ref COLLECTION_TICKS: IntCounter = register_int_counter!(
        "monitor_collection_ticks_total",
        "Total number of metric collection ticks"
    ).unwrap();

    pub static ref METRIC_STORE_SIZE: IntGauge = register_int_gauge!(
        "monitor_metric_store_size",
        "Number of metric samples currently retained"
    ).unwrap();

    pub static ref ALERT_STORE_SIZE: IntGauge = register_int_gauge!(
        "monitor_alert_store_size",
        "Number of alerts currently retained"
    ).unwrap();

    pub static ref ALERTS_FIRED: IntCounterVec = register_int_counter_vec!(
        "monitor_alerts_fired_total",
        "Total number of alerts fired by severity",
        &["severity"]
    ).unwrap();

    // Simulation metrics
    pub static ref SIMULATIONS: IntCounterVec = register_int_counter_vec!(
        "simulator_runs_total",
        "Total number of simulation runs by how they ended",
        &["outcome"]
    ).unwrap();

    pub static ref SIMULATED_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "simulator_requests_total",
        "Total number of synthetic requests issued by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref SIMULATED_LATENCY: Histogram = register_histogram!(
        "simulator_request_latency_seconds",
        "Round trip time of synthetic requests",
        vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();
}

/// Times one HTTP request. The counter and histogram are updated when the
/// timer is finished with the response status.
pub struct RequestTimer {
    method: String,
    path: String,
    start: Instant,
}

impl RequestTimer {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self, status: u16) {
        let status = status.to_string();
        HTTP_REQUESTS
            .with_label_values(&[self.method.as_str(), self.path.as_str(), status.as_str()])
            .inc();
        HTTP_REQUEST_DURATION
            .with_label_values(&[self.method.as_str(), self.path.as_str()])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_collection_tick(metric_store_size: usize, alert_store_size: usize) {
    COLLECTION_TICKS.inc();
    METRIC_STORE_SIZE.set(metric_store_size as i64);
    ALERT_STORE_SIZE.set(alert_store_size as i64);
}

pub fn record_alert(severity: &str) {
    ALERTS_FIRED.with_label_values(&[severity]).inc();
}

pub fn record_simulation(cancelled: bool) {
    let outcome = if cancelled { "cancelled" } else { "completed" };
    SIMULATIONS.with_label_values(&[outcome]).inc();
}

pub fn record_simulated_request(success: bool, latency_secs: Option<f64>) {
    let outcome = if success { "success" } else { "failure" };
    SIMULATED_REQUESTS.with_label_values(&[outcome]).inc();
    if let Some(latency) = latency_secs {
        SIMULATED_LATENCY.observe(latency);
    }
}

/// Renders every registered metric in the prometheus text format.
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| crate::ToolkitError::Internal(e.to_string()))
}
