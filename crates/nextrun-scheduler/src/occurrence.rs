use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::{clock::Clock, error::Result};

/// A resolved instant plus how long to wait for it from the `now` it was
/// computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    at: DateTime<Tz>,
    wait: TimeDelta,
}

impl Occurrence {
    pub fn new(at: DateTime<Tz>, now: DateTime<Utc>) -> Self {
        let wait = at.signed_duration_since(now);
        Self { at, wait }
    }

    /// The resolved instant, in the schedule's location.
    pub fn at(&self) -> DateTime<Tz> {
        self.at
    }

    pub fn wait(&self) -> TimeDelta {
        self.wait
    }

    /// `wait` as a `std::time::Duration`; a negative wait becomes zero.
    pub fn wait_std(&self) -> std::time::Duration {
        self.wait.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

impl std::fmt::Display for Occurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (in {}s)",
            self.at.format("%Y-%m-%d %H:%M:%S%.f %Z %A"),
            self.wait.num_seconds()
        )
    }
}

/// Anything that can turn a reference instant into its next occurrence.
pub trait Resolve {
    fn resolve(&self, now: DateTime<Utc>) -> Result<Occurrence>;

    /// Whether the schedule re-arms after it fires.
    fn repeat(&self) -> bool {
        false
    }
}

/// A schedule together with the occurrence it last resolved to.
///
/// `next` yields the successor state, which exposes `next` again; a repeat
/// loop is just a chain of these.
#[derive(Debug, Clone)]
pub struct Scheduled<R> {
    schedule: R,
    occurrence: Occurrence,
}

impl<R: Resolve + Clone> Scheduled<R> {
    /// Resolve `schedule` against a single reading of `clock`.
    pub fn resolve(schedule: R, clock: &dyn Clock) -> Result<Self> {
        let occurrence = schedule.resolve(clock.now())?;
        Ok(Self {
            schedule,
            occurrence,
        })
    }

    pub fn next(&self, clock: &dyn Clock) -> Result<Self> {
        Self::resolve(self.schedule.clone(), clock)
    }

    pub fn schedule(&self) -> &R {
        &self.schedule
    }

    pub fn occurrence(&self) -> &Occurrence {
        &self.occurrence
    }

    pub fn into_occurrence(self) -> Occurrence {
        self.occurrence
    }
}
