// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the certificate controller.
//!
//! All metrics use the namespace prefix `certificate_controller_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Decisions taken by the engine
//! - **Write Metrics** - Annotation writes and their outcomes
//! - **Watch Metrics** - Events delivered by the watch and the size of its cache
//! - **Error Metrics** - Errors by category
//! - **Leader Election Metrics** - Leadership state changes
//!
//! # Example
//!
//! ```rust,no_run
//! use certificate_controller::metrics::{record_write_success, METRICS_REGISTRY};
//!
//! record_write_success(std::time::Duration::from_millis(40));
//! ```

use prometheus::{
    Counter, CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all controller metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "certificate_controller";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliation decisions
///
/// Labels:
/// - `action`: Decision taken (`noop`, `set`, `clear`, `deleted`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliation decisions by action",
    );
    let counter = CounterVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Events merged into an already pending event while a write was in flight
pub static COALESCED_EVENTS_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let counter = Counter::new(
        format!("{METRICS_NAMESPACE}_coalesced_events_total"),
        "Total number of events merged into a pending event for the same Service",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Write Metrics
// ============================================================================

/// Total number of annotation writes
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static ANNOTATION_WRITES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_annotation_writes_total"),
        "Total number of annotation writes by outcome",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of annotation writes in seconds, retries included
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static ANNOTATION_WRITE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_annotation_write_duration_seconds"),
        "Duration of annotation writes in seconds by outcome",
    )
    .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]);
    let histogram = HistogramVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Watch Metrics
// ============================================================================

/// Total number of events delivered to the engine
///
/// Labels:
/// - `kind`: Event kind (`added`, `updated`, `deleted`, `resync`)
pub static WATCH_EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_watch_events_total"),
        "Total number of watch events by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of Services currently held in the watch cache
pub static WATCHED_SERVICES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_watched_services"),
        "Number of Services currently held in the watch cache",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by category
///
/// Labels:
/// - `error_type`: Category of error (`conflict`, `transient`, `watch`, `malformed`, ...)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by category",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Leader Election Metrics
// ============================================================================

/// Total number of leader election events
///
/// Labels:
/// - `status`: Event type (`acquired`, `lost`)
pub static LEADER_ELECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_elections_total"),
        "Total number of leader election events by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Current leader election status
///
/// Labels:
/// - `pod_name`: Name of the pod
///
/// Value: 1 if leader, 0 if follower
pub static LEADER_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_status"),
        "Current leader election status (1 = leader, 0 = follower)",
    );
    let gauge = GaugeVec::new(opts, &["pod_name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a decision taken by the engine
///
/// # Arguments
/// * `action` - Action label (e.g., `set`, `noop`)
pub fn record_decision(action: &str) {
    RECONCILIATION_TOTAL.with_label_values(&[action]).inc();
}

/// Record an event merged into a pending one
pub fn record_coalesced() {
    COALESCED_EVENTS_TOTAL.inc();
}

/// Record a successful annotation write
///
/// # Arguments
/// * `duration` - Duration of the write, retries included
pub fn record_write_success(duration: Duration) {
    ANNOTATION_WRITES_TOTAL
        .with_label_values(&["success"])
        .inc();
    ANNOTATION_WRITE_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
}

/// Record a failed annotation write
///
/// # Arguments
/// * `error_type` - Category of the failure (e.g., `conflict`)
/// * `duration` - Duration of the write before failure
pub fn record_write_error(error_type: &str, duration: Duration) {
    ANNOTATION_WRITES_TOTAL.with_label_values(&["error"]).inc();
    ANNOTATION_WRITE_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
    record_error(error_type);
}

/// Record an event delivered to the engine
///
/// # Arguments
/// * `kind` - Event kind (e.g., `added`, `resync`)
pub fn record_watch_event(kind: &str) {
    WATCH_EVENTS_TOTAL.with_label_values(&[kind]).inc();
}

/// Set the number of Services held in the watch cache
pub fn set_watched_services(count: usize) {
    WATCHED_SERVICES.set(i64::try_from(count).unwrap_or(i64::MAX));
}

/// Record an error
///
/// # Arguments
/// * `error_type` - Category of error (e.g., `watch`, `malformed`)
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Record leader election acquired
///
/// # Arguments
/// * `pod_name` - Name of the pod that acquired leadership
pub fn record_leader_elected(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL
        .with_label_values(&["acquired"])
        .inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(1.0);
}

/// Record leader election lost
///
/// # Arguments
/// * `pod_name` - Name of the pod that lost leadership
pub fn record_leader_lost(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["lost"]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(0.0);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decision() {
        record_decision("set");

        let counter = RECONCILIATION_TOTAL.with_label_values(&["set"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_write_error() {
        record_write_error("conflict", Duration::from_millis(250));

        let writes = ANNOTATION_WRITES_TOTAL.with_label_values(&["error"]);
        assert!(writes.get() > 0.0);

        let errors = ERRORS_TOTAL.with_label_values(&["conflict"]);
        assert!(errors.get() > 0.0);

        let histogram = ANNOTATION_WRITE_DURATION_SECONDS.with_label_values(&["error"]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_watched_services_gauge() {
        set_watched_services(42);
        assert_eq!(WATCHED_SERVICES.get(), 42);
    }

    #[test]
    fn test_gather_metrics() {
        record_write_success(Duration::from_millis(100));

        let metrics_text = gather_metrics().expect("Gathering metrics should succeed");

        assert!(
            metrics_text.contains("certificate_controller"),
            "Metrics should contain namespace prefix"
        );
        assert!(
            metrics_text.contains("annotation_writes_total"),
            "Metrics should contain write counter"
        );
    }
}
