//! The driving loop: sample a [`PathSimulation`] on a fixed tick.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use ems_core::GeoPoint;

use crate::PathSimulation;

/// Shortest tick the loop will honour; `tokio::time::interval` panics on zero.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Receives every position the loop samples, in order.
pub trait PositionSink: Send {
    fn report(&mut self, position: GeoPoint);
}

impl<F> PositionSink for F
where
    F: FnMut(GeoPoint) + Send,
{
    fn report(&mut self, position: GeoPoint) {
        self(position)
    }
}

/// How a [`drive`] call ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The destination was reported.
    Arrived,
    /// The token fired first; the last reported position is wherever the
    /// vehicle had got to.
    Cancelled,
}

/// Advance along `sim`, reporting a position every `tick` until the duration
/// has elapsed, then report the exact destination once more.
///
/// The first report (the origin) happens immediately.  A zero-length path
/// reports its destination straight away.  Elapsed time comes from tokio's
/// clock, so paused-time tests drive it deterministically.
pub async fn drive<S: PositionSink + ?Sized>(
    sim:    &PathSimulation,
    tick:   Duration,
    sink:   &mut S,
    cancel: &CancellationToken,
) -> DriveOutcome {
    if cancel.is_cancelled() {
        return DriveOutcome::Cancelled;
    }
    if sim.total_km() <= 0.0 {
        sink.report(sim.destination());
        return DriveOutcome::Arrived;
    }

    let start = Instant::now();
    let arrival = sleep_until(start + sim.duration());
    tokio::pin!(arrival);

    let mut ticker = interval(tick.max(MIN_TICK));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!("drive cancelled");
                return DriveOutcome::Cancelled;
            }
            _ = &mut arrival => {
                sink.report(sim.destination());
                return DriveOutcome::Arrived;
            }
            _ = ticker.tick() => {
                sink.report(sim.position_at(start.elapsed()));
            }
        }
    }
}
