//! Prometheus metrics for the payout pipeline
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Container for all pipeline metrics
struct PipelineMetrics {
    acquisitions: CounterVec,
    payouts_triggered: Counter,
    payout_amount: Counter,
    batch_runs: Counter,
    batch_items: CounterVec,
    batch_duration: Histogram,
    api_requests: CounterVec,
}

/// Global storage for pipeline metrics
static PIPELINE_METRICS: OnceLock<PipelineMetrics> = OnceLock::new();

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup. If metric
/// registration fails, errors are logged and subsequent metric operations
/// become no-ops.
pub fn init_metrics() -> Result<(), String> {
    let metrics = PipelineMetrics {
        acquisitions: register_counter_vec!(
            "clipfund_acquisitions_total",
            "View-count acquisitions by strategy and outcome",
            &["strategy", "outcome"]
        )
        .map_err(|e| e.to_string())?,
        payouts_triggered: register_counter!(
            "clipfund_payouts_triggered_total",
            "Number of payouts committed"
        )
        .map_err(|e| e.to_string())?,
        payout_amount: register_counter!(
            "clipfund_payout_amount_total",
            "Total amount paid out, in currency units"
        )
        .map_err(|e| e.to_string())?,
        batch_runs: register_counter!(
            "clipfund_batch_runs_total",
            "Number of batch scheduler runs"
        )
        .map_err(|e| e.to_string())?,
        batch_items: register_counter_vec!(
            "clipfund_batch_items_total",
            "Batch items by outcome",
            &["outcome"]
        )
        .map_err(|e| e.to_string())?,
        batch_duration: register_histogram!(
            "clipfund_batch_duration_seconds",
            "Duration of batch scheduler runs"
        )
        .map_err(|e| e.to_string())?,
        api_requests: register_counter_vec!(
            "clipfund_api_requests_total",
            "Action endpoint requests by action",
            &["action"]
        )
        .map_err(|e| e.to_string())?,
    };

    PIPELINE_METRICS
        .set(metrics)
        .map_err(|_| "metrics already initialized".to_string())
}

/// Record one acquisition attempt outcome
pub fn record_acquisition(strategy: &str, outcome: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.acquisitions.with_label_values(&[strategy, outcome]).inc();
    }
}

/// Record a committed payout
pub fn record_payout(amount: &Decimal) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.payouts_triggered.inc();
        m.payout_amount.inc_by(amount.to_f64().unwrap_or(0.0));
    }
}

/// Record a batch run and its duration
pub fn record_batch_run(duration_secs: f64) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.batch_runs.inc();
        m.batch_duration.observe(duration_secs);
    }
}

/// Record one batch item outcome ("success" or "failure")
pub fn record_batch_item(outcome: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.batch_items.with_label_values(&[outcome]).inc();
    }
}

/// Record one action endpoint request
pub fn record_api_request(action: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.api_requests.with_label_values(&[action]).inc();
    }
}

/// Render all registered metrics in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
