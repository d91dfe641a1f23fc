//! Business metrics for the booking pipeline.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `seatgrid_bookings_total{outcome}` - Booking requests by outcome code
//! - `seatgrid_seats_booked_total` - Seats committed
//! - `seatgrid_gatekeeper_claims_total{result}` - Gatekeeper claim attempts
//! - `seatgrid_admission_peeks_total{result}` - Admission counter reads
//! - `seatgrid_reconciler_sweeps_total` - Reconciler sweep runs
//! - `seatgrid_reconciler_ghosts_released_total` - Ghost claims released
//!
//! ## Histograms
//! - `seatgrid_booking_duration_seconds` - End-to-end booking latency

use metrics::{describe_counter, describe_histogram};
use seatgrid_core::reconciler::SweepStats;

/// Register all metric descriptions. Call once at startup, before any metric
/// is recorded.
pub fn register_metrics() {
    describe_counter!(
        "seatgrid_bookings_total",
        "Booking requests by outcome code (success, SOLD_OUT, CONFLICT_CACHED, ...)"
    );
    describe_counter!("seatgrid_seats_booked_total", "Seats committed to buyers");
    describe_counter!(
        "seatgrid_gatekeeper_claims_total",
        "Gatekeeper claim attempts by result (granted, rejected, error)"
    );
    describe_counter!(
        "seatgrid_admission_peeks_total",
        "Admission counter reads by result (hit, miss)"
    );
    describe_counter!(
        "seatgrid_reconciler_sweeps_total",
        "Reconciler sweep runs completed"
    );
    describe_counter!(
        "seatgrid_reconciler_ghosts_released_total",
        "Stale claims released because their seats were never sold"
    );
    describe_histogram!(
        "seatgrid_booking_duration_seconds",
        "End-to-end booking request latency"
    );

    tracing::info!("Business metrics registered");
}

/// Record one booking request.
pub fn record_booking(outcome: &'static str, seats: usize, duration_secs: f64) {
    metrics::counter!("seatgrid_bookings_total", "outcome" => outcome).increment(1);
    if seats > 0 {
        metrics::counter!("seatgrid_seats_booked_total").increment(seats as u64);
    }
    metrics::histogram!("seatgrid_booking_duration_seconds").record(duration_secs);
}

/// Record one Gatekeeper claim attempt.
pub fn record_gatekeeper_claim(result: &'static str) {
    metrics::counter!("seatgrid_gatekeeper_claims_total", "result" => result).increment(1);
}

/// Record one admission counter read.
pub fn record_admission_peek(result: &'static str) {
    metrics::counter!("seatgrid_admission_peeks_total", "result" => result).increment(1);
}

/// Record one reconciler sweep.
pub fn record_sweep(stats: &SweepStats) {
    metrics::counter!("seatgrid_reconciler_sweeps_total").increment(1);
    if stats.released > 0 {
        metrics::counter!("seatgrid_reconciler_ghosts_released_total")
            .increment(stats.released as u64);
    }
}
