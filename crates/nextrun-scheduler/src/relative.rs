use chrono::{
    DateTime, Days, LocalResult, Months, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use tracing::debug;

use crate::{
    error::{Result, SchedulerError},
    field::Offsets,
    occurrence::{Occurrence, Resolve},
};

/// Resolve `now + offsets`.
///
/// Years, months and days (weeks folded in) are applied on the local
/// calendar of `offsets.location`; hours down to nanoseconds are then added as
/// a flat duration. Fails with `PastTime` unless the result is strictly after
/// `now`.
pub fn resolve_relative(offsets: &Offsets, now: DateTime<Utc>) -> Result<Occurrence> {
    let location = offsets.location;
    let local = now.with_timezone(&location);

    let months = offsets
        .calendar_months()
        .ok_or_else(|| out_of_range("month offset"))?;
    let days = offsets
        .calendar_days()
        .ok_or_else(|| out_of_range("day offset"))?;

    let naive = shift_days(shift_months(local.naive_local(), months)?, days)?;
    let dated = localize(location, naive).ok_or_else(|| out_of_range("calendar offset"))?;

    let at = dated
        .checked_add_signed(clock_offset(offsets)?)
        .ok_or_else(|| out_of_range("clock offset"))?
        .with_timezone(&location);

    if at <= now {
        return Err(SchedulerError::PastTime {
            at: at.with_timezone(&Utc),
        });
    }

    debug!(%at, "relative schedule resolved");
    Ok(Occurrence::new(at, now))
}

impl Resolve for Offsets {
    fn resolve(&self, now: DateTime<Utc>) -> Result<Occurrence> {
        resolve_relative(self, now)
    }
}

fn shift_months(naive: NaiveDateTime, months: i64) -> Result<NaiveDateTime> {
    let n = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range("month offset"))?;
    let shifted = if months >= 0 {
        naive.checked_add_months(Months::new(n))
    } else {
        naive.checked_sub_months(Months::new(n))
    };
    shifted.ok_or_else(|| out_of_range("month offset"))
}

fn shift_days(naive: NaiveDateTime, days: i64) -> Result<NaiveDateTime> {
    let n = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        naive.checked_add_days(n)
    } else {
        naive.checked_sub_days(n)
    };
    shifted.ok_or_else(|| out_of_range("day offset"))
}

fn clock_offset(offsets: &Offsets) -> Result<TimeDelta> {
    let parts = [
        TimeDelta::try_hours(offsets.hours),
        TimeDelta::try_minutes(offsets.minutes),
        TimeDelta::try_seconds(offsets.seconds),
        Some(TimeDelta::nanoseconds(offsets.nanoseconds)),
    ];
    parts
        .into_iter()
        .try_fold(TimeDelta::zero(), |acc, part| acc.checked_add(&part?))
        .ok_or_else(|| out_of_range("clock offset"))
}

/// Map a local wall time into `location`. Ambiguous times take the earlier
/// instant; times inside a gap keep the offset in force before the shift, so
/// they land as far past the gap as they were into it.
fn localize(location: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match location.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // A day back is clear of the gap and still under the old offset.
            let before = location
                .from_local_datetime(&naive.checked_sub_days(Days::new(1))?)
                .earliest()?
                .offset()
                .fix();
            let utc = naive.checked_sub_signed(TimeDelta::seconds(i64::from(
                before.local_minus_utc(),
            )))?;
            Some(location.from_utc_datetime(&utc))
        }
    }
}

fn out_of_range(what: &str) -> SchedulerError {
    SchedulerError::OutOfRange(format!("{what} exceeds the supported date range"))
}
