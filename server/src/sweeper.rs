//! Background reconciler task.
//!
//! One long-running task sweeps every known event on a fixed interval and
//! stops when the shutdown channel flips. Sweep math lives in
//! `seatgrid_core::reconciler`; this module only owns the timer, the metrics
//! and the shutdown wiring.

use seatgrid_core::reconciler::Reconciler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::metrics::record_sweep;

/// Spawn the reconciler loop. The task sweeps once per `sweep_interval` and
/// exits when `shutdown` observes `true` or its sender is dropped.
#[must_use]
pub fn spawn_reconciler(
    reconciler: Arc<Reconciler>,
    sweep_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = sweep_interval.as_secs(), "Reconciler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = reconciler.sweep_all().await;
                    record_sweep(&stats);
                    if stats.released > 0 || stats.failed > 0 {
                        info!(
                            events = stats.events,
                            failed = stats.failed,
                            stale = stats.stale,
                            released = stats.released,
                            "Reconciler sweep finished"
                        );
                    } else {
                        debug!(events = stats.events, "Reconciler sweep found nothing to do");
                    }
                }
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                }
            }
        }

        info!("Reconciler stopped");
    })
}
