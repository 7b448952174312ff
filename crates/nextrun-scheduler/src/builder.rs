//! Chainable schedule builders.
//!
//! Every setter consumes the builder and returns the updated copy, so the
//! value handed to a resolver is always a complete snapshot.
//!
//! ```
//! use chrono::Month;
//! use nextrun_scheduler::{FieldKind, Interval, Timer};
//!
//! let every_fortnight = Interval::new(true).add_week(2);
//! let new_year = Timer::new(false).month(Month::January).date(1).every(FieldKind::Year);
//! # let _ = (every_fortnight, new_year);
//! ```

use chrono::{DateTime, Month, Utc, Weekday};
use chrono_tz::Tz;
use nextrun_core::ResolverConfig;

use crate::{
    absolute::{resolve_absolute_with, MAX_ATTEMPTS},
    clock::Clock,
    error::Result,
    field::{Field, FieldKind, FieldSet, Offsets},
    occurrence::{Occurrence, Resolve, Scheduled},
    relative::resolve_relative,
};

/// Frequency-based schedule: fires after an accumulated offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    offsets: Offsets,
    repeat: bool,
}

impl Interval {
    pub fn new(repeat: bool) -> Self {
        Self::from_offsets(Offsets::default(), repeat)
    }

    pub fn from_offsets(offsets: Offsets, repeat: bool) -> Self {
        Self { offsets, repeat }
    }

    /// Empty interval in the configured location.
    pub fn configured(config: &ResolverConfig, repeat: bool) -> nextrun_core::Result<Self> {
        Ok(Self::new(repeat).in_location(config.tz()?))
    }

    pub fn add_year(mut self, val: i64) -> Self {
        self.offsets.years = self.offsets.years.saturating_add(val);
        self
    }

    pub fn add_month(mut self, val: i64) -> Self {
        self.offsets.months = self.offsets.months.saturating_add(val);
        self
    }

    /// Weeks are resolved as seven days each.
    pub fn add_week(mut self, val: i64) -> Self {
        self.offsets.weeks = self.offsets.weeks.saturating_add(val);
        self
    }

    pub fn add_day(mut self, val: i64) -> Self {
        self.offsets.days = self.offsets.days.saturating_add(val);
        self
    }

    pub fn add_hour(mut self, val: i64) -> Self {
        self.offsets.hours = self.offsets.hours.saturating_add(val);
        self
    }

    pub fn add_minute(mut self, val: i64) -> Self {
        self.offsets.minutes = self.offsets.minutes.saturating_add(val);
        self
    }

    pub fn add_second(mut self, val: i64) -> Self {
        self.offsets.seconds = self.offsets.seconds.saturating_add(val);
        self
    }

    pub fn add_nanosecond(mut self, val: i64) -> Self {
        self.offsets.nanoseconds = self.offsets.nanoseconds.saturating_add(val);
        self
    }

    pub fn in_location(mut self, location: Tz) -> Self {
        self.offsets.location = location;
        self
    }

    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Resolve against one reading of `clock`.
    pub fn next(self, clock: &dyn Clock) -> Result<Scheduled<Self>> {
        Scheduled::resolve(self, clock)
    }
}

impl Resolve for Interval {
    fn resolve(&self, now: DateTime<Utc>) -> Result<Occurrence> {
        resolve_relative(&self.offsets, now)
    }

    fn repeat(&self) -> bool {
        self.repeat
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let o = &self.offsets;
        write!(
            f,
            "{}yrs {}months {}weeks {}days {}hrs {}mins {}secs {}nsecs",
            o.years, o.months, o.weeks, o.days, o.hours, o.minutes, o.seconds, o.nanoseconds
        )
    }
}

/// Clock-time schedule: fires at the next instant matching its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    fields: FieldSet,
    repeat: bool,
    max_attempts: u32,
}

impl Timer {
    pub fn new(repeat: bool) -> Self {
        Self::from_fields(FieldSet::default(), repeat)
    }

    pub fn from_fields(fields: FieldSet, repeat: bool) -> Self {
        Self {
            fields,
            repeat,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Empty timer using the configured location and attempt ceiling.
    pub fn configured(config: &ResolverConfig, repeat: bool) -> nextrun_core::Result<Self> {
        Ok(Self::new(repeat)
            .in_location(config.tz()?)
            .with_max_attempts(config.max_attempts))
    }

    pub fn year(self, val: u32) -> Self {
        self.set(FieldKind::Year, Field::At(val))
    }

    pub fn month(self, val: Month) -> Self {
        self.set(FieldKind::Month, Field::At(val.number_from_month()))
    }

    pub fn weekday(self, val: Weekday) -> Self {
        self.set(FieldKind::Weekday, Field::At(val.num_days_from_sunday()))
    }

    /// Day of the month.
    pub fn date(self, val: u32) -> Self {
        self.set(FieldKind::Date, Field::At(val))
    }

    pub fn hour(self, val: u32) -> Self {
        self.set(FieldKind::Hour, Field::At(val))
    }

    pub fn minute(self, val: u32) -> Self {
        self.set(FieldKind::Minute, Field::At(val))
    }

    pub fn second(self, val: u32) -> Self {
        self.set(FieldKind::Second, Field::At(val))
    }

    pub fn nanosecond(self, val: u32) -> Self {
        self.set(FieldKind::Nanosecond, Field::At(val))
    }

    /// Match whatever `now` holds in `kind` at resolution time.
    pub fn every(self, kind: FieldKind) -> Self {
        self.set(kind, Field::Every)
    }

    pub fn set(mut self, kind: FieldKind, field: Field) -> Self {
        self.fields = self.fields.with(kind, field);
        self
    }

    pub fn in_location(mut self, location: Tz) -> Self {
        self.fields.location = location;
        self
    }

    /// Override the carry-search ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Resolve against one reading of `clock`.
    pub fn next(self, clock: &dyn Clock) -> Result<Scheduled<Self>> {
        Scheduled::resolve(self, clock)
    }
}

impl Resolve for Timer {
    fn resolve(&self, now: DateTime<Utc>) -> Result<Occurrence> {
        resolve_absolute_with(&self.fields, now, self.max_attempts)
    }

    fn repeat(&self) -> bool {
        self.repeat
    }
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// `*` for a wildcard, zero-padded digits otherwise (unset renders as 0).
fn render(field: Field, width: usize) -> String {
    match field {
        Field::At(v) => format!("{v:0width$}"),
        Field::Every => "*".to_string(),
        Field::Unset => format!("{:0width$}", 0),
    }
}

impl std::fmt::Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.fields;
        write!(
            f,
            "{}-{}-{} {}:{}:{}.{} {}",
            render(s.year, 4),
            render(s.month, 2),
            render(s.date, 2),
            render(s.hour, 2),
            render(s.minute, 2),
            render(s.second, 2),
            render(s.nanosecond, 1),
            s.location.name(),
        )?;
        match s.weekday {
            Field::At(n) => match WEEKDAY_NAMES.get(n as usize) {
                Some(name) => write!(f, " {name}"),
                None => write!(f, " {n}"),
            },
            Field::Every => write!(f, " *"),
            Field::Unset => Ok(()),
        }
    }
}
