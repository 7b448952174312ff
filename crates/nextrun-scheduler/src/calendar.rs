use chrono::NaiveDate;
use chrono_tz::Tz;

/// Number of days in `month` of `year`.
///
/// Every location shares the proleptic Gregorian calendar, so `location` only
/// rides along for callers that carry one. Returns 0 for a month outside 1..=12.
pub fn days_in_month(month: u32, year: i32, _location: Tz) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}
