use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    error::Result,
    occurrence::{Occurrence, Resolve},
};

/// Cancellable wait loop around a schedule.
///
/// Resolves the schedule, sleeps until the occurrence, forwards it on the
/// fired channel and, if the schedule repeats, resolves again from no earlier
/// than the instant that just fired. It never runs anything itself; receivers
/// decide what a firing means.
pub struct Ticker<R> {
    schedule: R,
    clock: Arc<dyn Clock>,
}

impl<R: Resolve> Ticker<R> {
    pub fn new(schedule: R, clock: Arc<dyn Clock>) -> Self {
        Self { schedule, clock }
    }

    /// Run until the schedule is exhausted or `shutdown` broadcasts `true`.
    ///
    /// Returns how many occurrences fired. A resolution error ends the loop
    /// and is returned as-is.
    pub async fn run(
        self,
        fired_tx: mpsc::Sender<Occurrence>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<u64> {
        let repeat = self.schedule.repeat();
        info!(repeat, "ticker started");
        let mut fired = 0u64;
        let mut last_fired: Option<DateTime<Utc>> = None;

        loop {
            if *shutdown.borrow() {
                info!(fired, "ticker cancelled");
                return Ok(fired);
            }

            // A frozen or lagging clock must not fire the same instant twice.
            let now = match last_fired {
                Some(at) => self.clock.now().max(at),
                None => self.clock.now(),
            };
            let occurrence = self
                .schedule
                .resolve(now)
                .inspect_err(|e| warn!(code = e.code(), "ticker stopped: {e}"))?;
            debug!(
                at = %occurrence.at(),
                wait_secs = occurrence.wait().num_seconds(),
                "waiting for next occurrence"
            );

            tokio::select! {
                _ = tokio::time::sleep(occurrence.wait_std()) => {}
                changed = shutdown.changed() => {
                    // A dropped sender can never cancel us again; treat it as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        info!(fired, "ticker cancelled");
                        return Ok(fired);
                    }
                    continue;
                }
            }

            fired += 1;
            last_fired = Some(occurrence.at().with_timezone(&Utc));
            info!(at = %occurrence.at(), fired, "occurrence fired");
            // try_send never blocks the loop; a full or closed channel only loses this firing.
            if fired_tx.try_send(occurrence).is_err() {
                warn!("fired channel full or closed, occurrence dropped");
            }

            if !repeat {
                break;
            }
        }

        info!(fired, "ticker finished");
        Ok(fired)
    }
}
