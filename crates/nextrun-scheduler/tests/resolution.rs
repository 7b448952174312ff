// End-to-end resolution behaviour through the public API, with time frozen.

use chrono::{DateTime, Month, TimeDelta, TimeZone, Utc};
use nextrun_scheduler::{
    days_in_month, resolve_absolute, resolve_relative, Field, FieldKind, FieldSet, FixedClock,
    Interval, Offsets, SchedulerError, Timer,
};

fn frozen() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn concrete_future_timer_resolves_exactly() {
    let next = Timer::new(false)
        .year(2020)
        .month(Month::January)
        .date(2)
        .hour(0)
        .minute(0)
        .second(0)
        .next(&FixedClock(frozen()))
        .unwrap();

    assert_eq!(
        next.occurrence().at(),
        chrono_tz::UTC.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap()
    );
    assert_eq!(next.occurrence().wait(), TimeDelta::days(1));
}

#[test]
fn everything_open_fires_next_second() {
    let fields = FieldKind::ALL
        .into_iter()
        .fold(FieldSet::default(), |acc, kind| acc.with(kind, Field::Every));
    let occ = resolve_absolute(&fields, frozen()).unwrap();
    assert_eq!(occ.wait(), TimeDelta::seconds(1));
}

#[test]
fn leap_february() {
    assert_eq!(days_in_month(2, 2020, chrono_tz::UTC), 29);
    assert_eq!(days_in_month(2, 2021, chrono_tz::UTC), 28);
}

#[test]
fn impossible_date_in_past_year_terminates() {
    let fields = FieldSet::default()
        .with(FieldKind::Year, Field::At(2019))
        .with(FieldKind::Month, Field::At(2))
        .with(FieldKind::Date, Field::At(31));
    match resolve_absolute(&fields, frozen()) {
        Err(SchedulerError::UnresolvableSchedule { attempts }) => assert_eq!(attempts, 100),
        other => panic!("expected unresolvable schedule, got {other:?}"),
    }
}

#[test]
fn zero_interval_is_past_time() {
    let err = resolve_relative(&Offsets::default(), frozen()).unwrap_err();
    assert!(matches!(err, SchedulerError::PastTime { .. }));
}

#[test]
fn one_week_is_seven_days() {
    let clock = FixedClock(frozen());
    let week = Interval::new(false).add_week(1).next(&clock).unwrap();
    let days = Interval::new(false).add_day(7).next(&clock).unwrap();
    assert_eq!(week.occurrence(), days.occurrence());
}

#[test]
fn repeated_resolution_is_deterministic() {
    let timer = Timer::new(true).hour(6).minute(30).second(0);
    let clock = FixedClock(Utc.with_ymd_and_hms(2022, 8, 14, 7, 0, 0).unwrap());
    let a = timer.next(&clock).unwrap();
    let b = timer.next(&clock).unwrap();
    assert_eq!(a.occurrence(), b.occurrence());
    assert_eq!(a.next(&clock).unwrap().occurrence(), a.occurrence());
}

#[test]
fn year_bounds() {
    let clock = FixedClock(frozen());
    let err = Timer::new(false).year(10_000).next(&clock).unwrap_err();
    assert_eq!(
        err,
        SchedulerError::InvalidField {
            field: FieldKind::Year,
            value: 10_000,
            min: 1,
            max: 9999,
        }
    );
    assert_eq!(err.to_string(), "Invalid year: 10000 (expected 1..=9999)");

    let ok = Timer::new(false)
        .year(9999)
        .month(Month::June)
        .date(15)
        .hour(12)
        .minute(0)
        .second(0)
        .nanosecond(0)
        .next(&clock)
        .unwrap();
    assert_eq!(
        ok.occurrence().at(),
        chrono_tz::UTC.with_ymd_and_hms(9999, 6, 15, 12, 0, 0).unwrap()
    );
}

#[test]
fn error_codes_are_stable() {
    let clock = FixedClock(frozen());
    let cases = [
        (Timer::new(false).minute(60).next(&clock).unwrap_err(), "INVALID_FIELD"),
        (Interval::new(false).next(&clock).unwrap_err(), "PAST_TIME"),
        (
            Timer::new(false)
                .year(2000)
                .month(Month::May)
                .date(5)
                .hour(5)
                .minute(5)
                .second(5)
                .next(&clock)
                .unwrap_err(),
            "UNRESOLVABLE_SCHEDULE",
        ),
    ];
    for (err, code) in cases {
        assert_eq!(err.code(), code, "{err}");
    }
}
