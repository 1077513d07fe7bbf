// Metrics for lock sessions
// Recorded through the `metrics` facade; the embedding process installs an exporter

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Initialize metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!("holdfast_acquire_total", "Total number of successful lock acquisitions");
    describe_counter!(
        "holdfast_acquire_failed_total",
        "Total number of lock acquisitions that timed out"
    );
    describe_histogram!(
        "holdfast_acquire_wait_seconds",
        "Time spent waiting for a lock before it was acquired"
    );
    describe_counter!("holdfast_release_total", "Total number of lock releases");
    describe_histogram!("holdfast_hold_seconds", "Time a lock was held");
    describe_counter!(
        "holdfast_lease_lost_total",
        "Total number of critical sections aborted because the lease was lost"
    );
    describe_counter!(
        "holdfast_bypassed_total",
        "Total number of sessions run without locking"
    );

    tracing::info!("Lock metrics initialized");
}

pub(crate) fn record_acquired(wait: Duration) {
    counter!("holdfast_acquire_total").increment(1);
    histogram!("holdfast_acquire_wait_seconds").record(wait.as_secs_f64());
}

pub(crate) fn record_acquire_failed() {
    counter!("holdfast_acquire_failed_total").increment(1);
}

pub(crate) fn record_released(released: bool, held: Duration) {
    let outcome = if released { "released" } else { "stale" };
    counter!("holdfast_release_total", "outcome" => outcome).increment(1);
    histogram!("holdfast_hold_seconds").record(held.as_secs_f64());
}

pub(crate) fn record_lease_lost() {
    counter!("holdfast_lease_lost_total").increment(1);
}

pub(crate) fn record_bypassed() {
    counter!("holdfast_bypassed_total").increment(1);
}
