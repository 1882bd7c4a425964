use chrono::{TimeZone, Utc};

use crate::core::scheduler::{compute_next_run, parse_time_of_day};
use crate::core::store::types::Frequency;

// 2024-01-01 was a Monday, so day_of_week 1 = Monday in these fixtures.
fn at(day: u32, hour: u32, minute: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

#[test]
fn parses_wall_clock_times() {
    assert_eq!(parse_time_of_day("10:00").unwrap(), (10, 0));
    assert_eq!(parse_time_of_day("23:59").unwrap(), (23, 59));
    assert!(parse_time_of_day("24:00").is_err());
    assert!(parse_time_of_day("10:60").is_err());
    assert!(parse_time_of_day("10").is_err());
    assert!(parse_time_of_day("ten:00").is_err());
}

#[test]
fn weekly_from_another_weekday_lands_on_the_target_day() {
    // Tuesday 09:00, Monday slot at 10:00 -> next Monday.
    let next = compute_next_run(at(2, 9, 0), Frequency::Weekly, Some(1), "10:00").unwrap();
    assert_eq!(next, at(8, 10, 0));
}

#[test]
fn weekly_same_day_before_the_slot_fires_today() {
    let next = compute_next_run(at(1, 9, 0), Frequency::Weekly, Some(1), "10:00").unwrap();
    assert_eq!(next, at(1, 10, 0));
}

#[test]
fn weekly_same_day_after_the_slot_waits_a_week() {
    let next = compute_next_run(at(1, 11, 0), Frequency::Weekly, Some(1), "10:00").unwrap();
    assert_eq!(next, at(8, 10, 0));
}

#[test]
fn weekly_without_a_day_keeps_the_current_weekday() {
    let next = compute_next_run(at(1, 9, 0), Frequency::Weekly, None, "10:00").unwrap();
    assert_eq!(next, at(1, 10, 0));
    let next = compute_next_run(at(1, 11, 0), Frequency::Weekly, None, "10:00").unwrap();
    assert_eq!(next, at(8, 10, 0));
}

#[test]
fn sunday_is_day_zero() {
    // Monday 09:00 with a Sunday slot -> the coming Sunday.
    let next = compute_next_run(at(1, 9, 0), Frequency::Weekly, Some(0), "10:00").unwrap();
    assert_eq!(next, at(7, 10, 0));
}

#[test]
fn daily_rolls_over_at_the_slot() {
    assert_eq!(
        compute_next_run(at(1, 9, 0), Frequency::Daily, None, "10:00").unwrap(),
        at(1, 10, 0)
    );
    assert_eq!(
        compute_next_run(at(1, 11, 0), Frequency::Daily, None, "10:00").unwrap(),
        at(2, 10, 0)
    );
}

#[test]
fn biweekly_is_the_weekly_slot_plus_a_week() {
    let next = compute_next_run(at(2, 9, 0), Frequency::Biweekly, Some(1), "10:00").unwrap();
    assert_eq!(next, at(15, 10, 0));
}

#[test]
fn monthly_keeps_the_day_of_month() {
    let next = compute_next_run(at(15, 12, 0), Frequency::Monthly, None, "09:00").unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 15, 9, 0, 0).unwrap());

    let next = compute_next_run(at(15, 8, 0), Frequency::Monthly, None, "09:00").unwrap();
    assert_eq!(next, at(15, 9, 0));
}

#[test]
fn next_run_is_always_in_the_future() {
    let now = at(3, 12, 30);
    for frequency in [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
    ] {
        for dow in [None, Some(0), Some(3), Some(6)] {
            let next = compute_next_run(now, frequency, dow, "12:30").unwrap();
            assert!(next > now, "{:?}/{:?} produced {}", frequency, dow, next);
        }
    }
}
