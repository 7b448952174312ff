use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// One component of an absolute schedule.
///
/// `Unset` and `Every` resolve the same way (seeded from `now`); keeping them
/// apart lets callers tell a forgotten field from an explicit wildcard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    #[default]
    Unset,
    Every,
    At(u32),
}

impl Field {
    pub fn is_concrete(self) -> bool {
        matches!(self, Field::At(_))
    }

    /// The concrete value, if any.
    pub fn value(self) -> Option<u32> {
        match self {
            Field::At(v) => Some(v),
            Field::Unset | Field::Every => None,
        }
    }
}

/// Names each component of a [`FieldSet`], in decreasing calendar granularity
/// (weekday sits beside the date it describes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Year,
    Month,
    Weekday,
    Date,
    Hour,
    Minute,
    Second,
    Nanosecond,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Year,
        FieldKind::Month,
        FieldKind::Weekday,
        FieldKind::Date,
        FieldKind::Hour,
        FieldKind::Minute,
        FieldKind::Second,
        FieldKind::Nanosecond,
    ];

    /// Inclusive legal range for a concrete value.
    ///
    /// `Date` is checked against 31 here; the month-specific maximum is applied
    /// during the carry search.
    pub fn bounds(self) -> (i64, i64) {
        match self {
            FieldKind::Year => (1, 9999),
            FieldKind::Month => (1, 12),
            // 0 = Sunday … 6 = Saturday
            FieldKind::Weekday => (0, 6),
            FieldKind::Date => (1, 31),
            FieldKind::Hour => (0, 23),
            FieldKind::Minute => (0, 59),
            FieldKind::Second => (0, 59),
            FieldKind::Nanosecond => (0, 999_999_999),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldKind::Year => "year",
            FieldKind::Month => "month",
            FieldKind::Weekday => "weekday",
            FieldKind::Date => "date",
            FieldKind::Hour => "hour",
            FieldKind::Minute => "minute",
            FieldKind::Second => "second",
            FieldKind::Nanosecond => "nanosecond",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "year" => Ok(FieldKind::Year),
            "month" => Ok(FieldKind::Month),
            "weekday" | "day" => Ok(FieldKind::Weekday),
            "date" => Ok(FieldKind::Date),
            "hour" => Ok(FieldKind::Hour),
            "minute" => Ok(FieldKind::Minute),
            "second" => Ok(FieldKind::Second),
            "nanosecond" | "nsec" => Ok(FieldKind::Nanosecond),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

/// Absolute calendar targets for one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(default)]
    pub year: Field,
    #[serde(default)]
    pub month: Field,
    /// Informational only; never constrains resolution.
    #[serde(default)]
    pub weekday: Field,
    #[serde(default)]
    pub date: Field,
    #[serde(default)]
    pub hour: Field,
    #[serde(default)]
    pub minute: Field,
    #[serde(default)]
    pub second: Field,
    #[serde(default)]
    pub nanosecond: Field,
    /// Calendar location all date arithmetic is done in.
    #[serde(default = "default_location")]
    pub location: Tz,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            year: Field::Unset,
            month: Field::Unset,
            weekday: Field::Unset,
            date: Field::Unset,
            hour: Field::Unset,
            minute: Field::Unset,
            second: Field::Unset,
            nanosecond: Field::Unset,
            location: default_location(),
        }
    }
}

impl FieldSet {
    pub fn get(&self, kind: FieldKind) -> Field {
        match kind {
            FieldKind::Year => self.year,
            FieldKind::Month => self.month,
            FieldKind::Weekday => self.weekday,
            FieldKind::Date => self.date,
            FieldKind::Hour => self.hour,
            FieldKind::Minute => self.minute,
            FieldKind::Second => self.second,
            FieldKind::Nanosecond => self.nanosecond,
        }
    }

    /// Copy of `self` with `kind` replaced.
    pub fn with(mut self, kind: FieldKind, field: Field) -> Self {
        let slot = match kind {
            FieldKind::Year => &mut self.year,
            FieldKind::Month => &mut self.month,
            FieldKind::Weekday => &mut self.weekday,
            FieldKind::Date => &mut self.date,
            FieldKind::Hour => &mut self.hour,
            FieldKind::Minute => &mut self.minute,
            FieldKind::Second => &mut self.second,
            FieldKind::Nanosecond => &mut self.nanosecond,
        };
        *slot = field;
        self
    }

    /// Reject any concrete field outside its calendar bound.
    pub fn validate(&self) -> Result<()> {
        for kind in FieldKind::ALL {
            if let Some(value) = self.get(kind).value() {
                let (min, max) = kind.bounds();
                let value = i64::from(value);
                if value < min || value > max {
                    return Err(SchedulerError::InvalidField {
                        field: kind,
                        value,
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Additive offsets for a relative schedule. Repeated additions accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offsets {
    #[serde(default)]
    pub years: i64,
    #[serde(default)]
    pub months: i64,
    #[serde(default)]
    pub weeks: i64,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
    #[serde(default)]
    pub nanoseconds: i64,
    #[serde(default = "default_location")]
    pub location: Tz,
}

impl Default for Offsets {
    fn default() -> Self {
        Self {
            years: 0,
            months: 0,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            nanoseconds: 0,
            location: default_location(),
        }
    }
}

impl Offsets {
    /// Whole months to add: years folded in at twelve each.
    pub fn calendar_months(&self) -> Option<i64> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    /// Whole days to add: weeks folded in at seven each.
    pub fn calendar_days(&self) -> Option<i64> {
        self.weeks.checked_mul(7)?.checked_add(self.days)
    }
}

fn default_location() -> Tz {
    chrono_tz::UTC
}
