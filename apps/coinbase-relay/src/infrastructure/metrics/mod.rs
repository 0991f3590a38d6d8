//! Prometheus Metrics Module
//!
//! Relay outcome counters and outbound latency, rendered at `/metrics`.
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::relay::RelayResult;

/// Counter of relayed requests, labelled by outcome category.
pub const REQUESTS_TOTAL: &str = "relay_requests_total";

/// Histogram of outbound call durations.
pub const OUTBOUND_LATENCY_SECONDS: &str = "relay_outbound_latency_seconds";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once and return its handle.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Handle for rendering, if metrics were initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Inbound relay requests by outcome category");
    describe_histogram!(
        OUTBOUND_LATENCY_SECONDS,
        "Duration of outbound Coinbase order calls"
    );
}

/// Record the terminal outcome of one relay.
pub fn record_outcome(result: &RelayResult) {
    counter!(REQUESTS_TOTAL, "outcome" => result.category()).increment(1);
}

/// Record how long an outbound call took, including failed ones.
pub fn record_outbound_latency(duration: Duration) {
    histogram!(OUTBOUND_LATENCY_SECONDS).record(duration.as_secs_f64());
}
