//! Absolute resolver: turn a partially wildcarded [`FieldSet`] into the
//! earliest matching instant strictly after `now`.
//!
//! Non-concrete fields are seeded from `now` (in the schedule's location),
//! giving one concrete candidate. While that candidate is not in the future,
//! the finest non-concrete unit is advanced by one and any overflow cascades
//! into coarser units:
//!
//! | Unit   | Overflows when           | Resets to | Carries into |
//! |--------|--------------------------|-----------|--------------|
//! | second | > 59                     | 0         | minute       |
//! | minute | > 59                     | 0         | hour         |
//! | hour   | > 23                     | 0         | date         |
//! | date   | > days in (month, year)  | 1         | month        |
//! | month  | > 12                     | 1         | year         |
//! | year   | > 9999                   | now's year| (none)       |
//!
//! The search gives up after a fixed number of carry steps.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::{
    calendar::days_in_month,
    error::{Result, SchedulerError},
    field::{Field, FieldSet},
    occurrence::{Occurrence, Resolve},
};

/// Default carry-step ceiling.
pub const MAX_ATTEMPTS: u32 = 100;

const MAX_YEAR: u32 = 9999;

/// Resolve with the default [`MAX_ATTEMPTS`] ceiling.
pub fn resolve_absolute(fields: &FieldSet, now: DateTime<Utc>) -> Result<Occurrence> {
    resolve_absolute_with(fields, now, MAX_ATTEMPTS)
}

/// Resolve `fields` against `now`, taking at most `max_attempts` carry steps.
///
/// Concrete fields are bounds-checked before any search. Weekday is carried
/// for display only and never filters candidates.
pub fn resolve_absolute_with(
    fields: &FieldSet,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<Occurrence> {
    fields.validate()?;

    let mut cursor = Cursor::seed(fields, now);
    let target = carry_target(fields);
    let mut attempts = 0;

    loop {
        cursor.settle();
        if let Some(at) = cursor.candidate().filter(|at| *at > now) {
            debug!(%at, attempts, "absolute schedule resolved");
            return Ok(Occurrence::new(at, now));
        }
        // Every searchable field is concrete: nothing left to move.
        let Some(unit) = target else { break };
        if attempts >= max_attempts {
            break;
        }
        cursor.advance(unit);
        attempts += 1;
    }

    debug!(attempts, "no upcoming date matches the schedule");
    Err(SchedulerError::UnresolvableSchedule { attempts })
}

impl Resolve for FieldSet {
    fn resolve(&self, now: DateTime<Utc>) -> Result<Occurrence> {
        resolve_absolute(self, now)
    }
}

/// Searchable units, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Year,
    Month,
    Date,
    Hour,
    Minute,
    Second,
}

impl Unit {
    fn coarser(self) -> Option<Unit> {
        match self {
            Unit::Year => None,
            Unit::Month => Some(Unit::Year),
            Unit::Date => Some(Unit::Month),
            Unit::Hour => Some(Unit::Date),
            Unit::Minute => Some(Unit::Hour),
            Unit::Second => Some(Unit::Minute),
        }
    }
}

/// The finest unit the caller left open; seeded last, advanced first.
fn carry_target(fields: &FieldSet) -> Option<Unit> {
    [
        (Unit::Second, fields.second),
        (Unit::Minute, fields.minute),
        (Unit::Hour, fields.hour),
        (Unit::Date, fields.date),
        (Unit::Month, fields.month),
        (Unit::Year, fields.year),
    ]
    .into_iter()
    .find(|(_, field)| !field.is_concrete())
    .map(|(unit, _)| unit)
}

/// Fully concrete candidate being searched.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    year: u32,
    month: u32,
    date: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanosecond: u32,
    location: Tz,
    /// Year the search wraps back to after 9999.
    wrap_year: u32,
}

impl Cursor {
    fn seed(fields: &FieldSet, now: DateTime<Utc>) -> Self {
        let local = now.with_timezone(&fields.location);
        let now_year = local.year().clamp(1, MAX_YEAR as i32) as u32;
        let pick = |field: Field, current: u32| field.value().unwrap_or(current);

        Self {
            year: pick(fields.year, now_year),
            month: pick(fields.month, local.month()),
            date: pick(fields.date, local.day()),
            hour: pick(fields.hour, local.hour()),
            minute: pick(fields.minute, local.minute()),
            second: pick(fields.second, local.second()),
            // The search works in whole seconds.
            nanosecond: fields.nanosecond.value().unwrap_or(0),
            location: fields.location,
            wrap_year: now_year,
        }
    }

    /// Increment `unit` once and bounds-check it. Returns true when it
    /// overflowed and the next coarser unit must be incremented.
    fn bump(&mut self, unit: Unit) -> bool {
        match unit {
            Unit::Second => roll(&mut self.second, 59, 0),
            Unit::Minute => roll(&mut self.minute, 59, 0),
            Unit::Hour => roll(&mut self.hour, 23, 0),
            Unit::Date => {
                let last = days_in_month(self.month, self.year as i32, self.location);
                roll(&mut self.date, last, 1)
            }
            Unit::Month => roll(&mut self.month, 12, 1),
            Unit::Year => {
                self.year += 1;
                if self.year > MAX_YEAR {
                    self.year = self.wrap_year;
                }
                false
            }
        }
    }

    /// Advance `unit` by one, cascading overflow outward.
    fn advance(&mut self, unit: Unit) {
        let mut next = Some(unit);
        while let Some(unit) = next {
            next = if self.bump(unit) { unit.coarser() } else { None };
        }
    }

    /// Roll a date past the end of its month into the next month.
    fn settle(&mut self) {
        if self.date > days_in_month(self.month, self.year as i32, self.location) {
            self.date = 1;
            self.advance(Unit::Month);
        }
    }

    /// The candidate as an instant. `None` for a wall time skipped by a
    /// DST shift; ambiguous wall times take the earlier instant.
    fn candidate(&self) -> Option<DateTime<Tz>> {
        let naive = NaiveDate::from_ymd_opt(self.year as i32, self.month, self.date)?
            .and_hms_nano_opt(self.hour, self.minute, self.second, self.nanosecond)?;
        self.location.from_local_datetime(&naive).earliest()
    }
}

fn roll(value: &mut u32, max: u32, reset: u32) -> bool {
    *value += 1;
    if *value > max {
        *value = reset;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use chrono::TimeDelta;

    fn jan_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        chrono_tz::UTC.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn fields(pairs: &[(FieldKind, u32)]) -> FieldSet {
        pairs
            .iter()
            .fold(FieldSet::default(), |acc, &(kind, v)| acc.with(kind, Field::At(v)))
    }

    fn clock_time(h: u32, m: u32, s: u32) -> FieldSet {
        fields(&[
            (FieldKind::Hour, h),
            (FieldKind::Minute, m),
            (FieldKind::Second, s),
        ])
    }

    #[test]
    fn concrete_future_instant_is_returned_as_is() {
        let set = fields(&[
            (FieldKind::Year, 2020),
            (FieldKind::Month, 1),
            (FieldKind::Date, 2),
            (FieldKind::Hour, 3),
            (FieldKind::Minute, 4),
            (FieldKind::Second, 5),
            (FieldKind::Nanosecond, 600),
        ]);
        let occ = resolve_absolute(&set, jan_first()).unwrap();
        let expected = chrono_tz::UTC
            .with_ymd_and_hms(2020, 1, 2, 3, 4, 5)
            .unwrap()
            + TimeDelta::nanoseconds(600);
        assert_eq!(occ.at(), expected);
        assert_eq!(occ.wait(), expected.signed_duration_since(jan_first()));
    }

    #[test]
    fn all_wildcards_advance_one_second() {
        let every = FieldKind::ALL
            .into_iter()
            .fold(FieldSet::default(), |acc, kind| acc.with(kind, Field::Every));
        let occ = resolve_absolute(&every, jan_first()).unwrap();
        assert_eq!(occ.at(), at(2020, 1, 1, 0, 0, 1));
        assert_eq!(occ.wait(), TimeDelta::seconds(1));

        let unset = resolve_absolute(&FieldSet::default(), jan_first()).unwrap();
        assert_eq!(unset, occ);
    }

    #[test]
    fn sub_second_now_still_lands_on_next_second() {
        let now = jan_first() + TimeDelta::milliseconds(500);
        let occ = resolve_absolute(&FieldSet::default(), now).unwrap();
        assert_eq!(occ.at(), at(2020, 1, 1, 0, 0, 1));
        assert_eq!(occ.wait(), TimeDelta::milliseconds(500));
    }

    #[test]
    fn passed_time_of_day_moves_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap();
        let occ = resolve_absolute(&clock_time(9, 0, 0), now).unwrap();
        assert_eq!(occ.at(), at(2020, 1, 2, 9, 0, 0));
        assert_eq!(occ.wait(), TimeDelta::hours(23));
    }

    #[test]
    fn open_hour_is_advanced_before_date() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 10, 45, 0).unwrap();
        let set = fields(&[(FieldKind::Minute, 30), (FieldKind::Second, 0)]);
        let occ = resolve_absolute(&set, now).unwrap();
        assert_eq!(occ.at(), at(2020, 1, 1, 11, 30, 0));
    }

    #[test]
    fn carry_overrides_a_concrete_date() {
        // Advancing the open hour past 23 carries into the date even though it is fixed.
        let now = Utc.with_ymd_and_hms(2020, 1, 15, 23, 30, 0).unwrap();
        let set = fields(&[
            (FieldKind::Date, 15),
            (FieldKind::Minute, 0),
            (FieldKind::Second, 0),
        ]);
        let occ = resolve_absolute(&set, now).unwrap();
        assert_eq!(occ.at(), at(2020, 1, 16, 0, 0, 0));
        assert_eq!(occ.wait(), TimeDelta::minutes(30));
    }

    #[test]
    fn date_overflow_carries_into_next_month() {
        let now = Utc.with_ymd_and_hms(2020, 1, 31, 12, 0, 0).unwrap();
        let occ = resolve_absolute(&clock_time(0, 0, 0), now).unwrap();
        assert_eq!(occ.at(), at(2020, 2, 1, 0, 0, 0));
    }

    #[test]
    fn year_end_cascades_through_every_unit() {
        let now = Utc.with_ymd_and_hms(2020, 12, 31, 12, 0, 0).unwrap();
        let occ = resolve_absolute(&clock_time(0, 0, 0), now).unwrap();
        assert_eq!(occ.at(), at(2021, 1, 1, 0, 0, 0));
    }

    #[test]
    fn open_year_advances_a_yearly_date() {
        let now = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        let set = fields(&[
            (FieldKind::Month, 1),
            (FieldKind::Date, 1),
            (FieldKind::Hour, 0),
            (FieldKind::Minute, 0),
            (FieldKind::Second, 0),
        ])
        .with(FieldKind::Year, Field::Every);
        let occ = resolve_absolute(&set, now).unwrap();
        assert_eq!(occ.at(), at(2021, 1, 1, 0, 0, 0));
    }

    #[test]
    fn february_thirty_first_rolls_into_march() {
        let set = fields(&[
            (FieldKind::Year, 2020),
            (FieldKind::Month, 2),
            (FieldKind::Date, 31),
        ]);
        let occ = resolve_absolute(&set, jan_first()).unwrap();
        assert_eq!(occ.at(), at(2020, 3, 1, 0, 0, 0));
    }

    #[test]
    fn february_thirty_first_in_a_past_year_terminates() {
        let set = fields(&[
            (FieldKind::Year, 2019),
            (FieldKind::Month, 2),
            (FieldKind::Date, 31),
        ]);
        let err = resolve_absolute(&set, jan_first()).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::UnresolvableSchedule {
                attempts: MAX_ATTEMPTS
            }
        );
    }

    #[test]
    fn fully_concrete_past_fails_without_searching() {
        let set = fields(&[
            (FieldKind::Year, 2019),
            (FieldKind::Month, 6),
            (FieldKind::Date, 1),
            (FieldKind::Hour, 0),
            (FieldKind::Minute, 0),
            (FieldKind::Second, 0),
        ]);
        let err = resolve_absolute(&set, jan_first()).unwrap_err();
        assert_eq!(err, SchedulerError::UnresolvableSchedule { attempts: 0 });
    }

    #[test]
    fn attempt_ceiling_is_configurable() {
        let set = fields(&[
            (FieldKind::Year, 2019),
            (FieldKind::Month, 1),
            (FieldKind::Date, 1),
        ]);
        let err = resolve_absolute_with(&set, jan_first(), 5).unwrap_err();
        assert_eq!(err, SchedulerError::UnresolvableSchedule { attempts: 5 });
    }

    #[test]
    fn invalid_field_fails_before_search() {
        let set = fields(&[(FieldKind::Year, 10_000), (FieldKind::Month, 1)]);
        let err = resolve_absolute_with(&set, jan_first(), 0).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::InvalidField {
                field: FieldKind::Year,
                value: 10_000,
                min: 1,
                max: 9999,
            }
        );
    }

    #[test]
    fn last_representable_year_resolves() {
        let set = fields(&[
            (FieldKind::Year, 9999),
            (FieldKind::Month, 12),
            (FieldKind::Date, 31),
            (FieldKind::Hour, 23),
            (FieldKind::Minute, 59),
            (FieldKind::Second, 59),
        ]);
        let occ = resolve_absolute(&set, jan_first()).unwrap();
        assert_eq!(occ.at(), at(9999, 12, 31, 23, 59, 59));
    }

    #[test]
    fn year_overflow_wraps_to_current_year() {
        let mut cursor = Cursor::seed(&FieldSet::default(), jan_first());
        cursor.year = MAX_YEAR;
        cursor.advance(Unit::Year);
        assert_eq!(cursor.year, 2020);
    }

    #[test]
    fn weekday_does_not_constrain() {
        // 2020-01-01 is a Wednesday; a Monday weekday is carried, not enforced.
        let set = FieldSet::default().with(FieldKind::Weekday, Field::At(1));
        let occ = resolve_absolute(&set, jan_first()).unwrap();
        assert_eq!(occ.at(), at(2020, 1, 1, 0, 0, 1));
    }

    #[test]
    fn wildcards_seed_from_local_time() {
        let tokyo = chrono_tz::Asia::Tokyo;
        // 00:00 UTC is 09:00 JST, so today's 09:00 is not strictly after now.
        let set = FieldSet {
            location: tokyo,
            ..clock_time(9, 0, 0)
        };
        let occ = resolve_absolute(&set, jan_first()).unwrap();
        assert_eq!(occ.at(), tokyo.with_ymd_and_hms(2020, 1, 2, 9, 0, 0).unwrap());
        assert_eq!(occ.wait(), TimeDelta::hours(24));
    }

    #[test]
    fn skipped_wall_time_moves_to_next_day() {
        let ny = chrono_tz::America::New_York;
        // Midnight EST on the spring-forward date; 02:30 does not exist that day.
        let now = Utc.with_ymd_and_hms(2020, 3, 8, 5, 0, 0).unwrap();
        let set = FieldSet {
            location: ny,
            ..clock_time(2, 30, 0)
        };
        let occ = resolve_absolute(&set, now).unwrap();
        assert_eq!(occ.at(), ny.with_ymd_and_hms(2020, 3, 9, 2, 30, 0).unwrap());
    }

    #[test]
    fn same_input_same_output() {
        let set = clock_time(7, 15, 0);
        let now = Utc.with_ymd_and_hms(2021, 5, 17, 8, 0, 0).unwrap();
        assert_eq!(
            resolve_absolute(&set, now).unwrap(),
            resolve_absolute(&set, now).unwrap()
        );
    }
}
