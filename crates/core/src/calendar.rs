//! Pure UTC calendar window helpers (C3)
//!
//! Each function maps a UNIX second timestamp to the left/right edge of
//! the hourly, daily, weekly, or monthly window that contains it. Weeks
//! follow ISO-8601 (Monday = 1), resolving the Open Question in spec §9.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

const SECONDS_PER_HOUR: u32 = 3600;
const SECONDS_PER_DAY: u32 = 86_400;
const SECONDS_PER_WEEK: u32 = 7 * SECONDS_PER_DAY;

/// Left edge (inclusive) of the hourly window containing `t`.
pub fn hour_left(t: u32) -> u32 {
    t - (t % SECONDS_PER_HOUR)
}

/// Right edge (inclusive) of the hourly window containing `t`.
pub fn hour_right(t: u32) -> u32 {
    hour_left(t) + SECONDS_PER_HOUR - 1
}

/// Left edge (inclusive) of the daily window containing `t`.
pub fn day_left(t: u32) -> u32 {
    t - (t % SECONDS_PER_DAY)
}

/// Right edge (inclusive) of the daily window containing `t`.
pub fn day_right(t: u32) -> u32 {
    day_left(t) + SECONDS_PER_DAY - 1
}

/// ISO-8601 weekday of `t`, Monday = 1 .. Sunday = 7.
pub fn weekday(t: u32) -> u32 {
    to_datetime(t).weekday().number_from_monday()
}

/// Left edge (inclusive) of the ISO-8601 week (Monday start) containing `t`.
pub fn week_left(t: u32) -> u32 {
    let offset_days = (weekday(t) - 1) as u32;
    day_left(t) - offset_days * SECONDS_PER_DAY
}

/// Right edge (inclusive) of the ISO-8601 week containing `t`.
pub fn week_right(t: u32) -> u32 {
    week_left(t) + SECONDS_PER_WEEK - 1
}

/// Left edge (inclusive) of the calendar month containing `t`: the first
/// second (UTC) of that month.
pub fn month_left(t: u32) -> u32 {
    let dt = to_datetime(t);
    let first_of_month = NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
        .expect("valid year/month")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");
    from_datetime(first_of_month)
}

/// Right edge (inclusive) of the calendar month containing `t`: the last
/// second (UTC) before the first second of the next month.
pub fn month_right(t: u32) -> u32 {
    let dt = to_datetime(t);
    let (next_year, next_month) = if dt.month() == 12 {
        (dt.year() + 1, 1)
    } else {
        (dt.year(), dt.month() + 1)
    };
    let first_of_next_month = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid year/month")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");
    from_datetime(first_of_next_month) - 1
}

fn to_datetime(t: u32) -> NaiveDateTime {
    Utc.timestamp_opt(t as i64, 0)
        .single()
        .expect("u32 seconds is always a valid UTC instant")
        .naive_utc()
}

fn from_datetime(dt: NaiveDateTime) -> u32 {
    dt.and_utc().timestamp() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_window_covers_3600_seconds() {
        let t = 12345;
        assert_eq!(hour_right(t) - hour_left(t) + 1, SECONDS_PER_HOUR);
        assert!(hour_left(t) <= t && t <= hour_right(t));
    }

    #[test]
    fn day_window_covers_86400_seconds() {
        let t = 500_000;
        assert_eq!(day_right(t) - day_left(t) + 1, SECONDS_PER_DAY);
        assert!(day_left(t) <= t && t <= day_right(t));
    }

    #[test]
    fn week_anchors_on_monday() {
        // 1970-01-05 is a Monday.
        let monday = 4 * SECONDS_PER_DAY; // 1970-01-05T00:00:00Z
        assert_eq!(week_left(monday), monday);
        assert_eq!(week_left(monday + 6 * SECONDS_PER_DAY + 100), monday);
        assert_eq!(week_right(monday) - week_left(monday) + 1, SECONDS_PER_WEEK);
    }

    #[test]
    fn month_window_spans_whole_month() {
        // 2024-02-15 12:00:00Z (leap year February)
        let t = 1_708_000_800u32;
        let left = month_left(t);
        let right = month_right(t);
        assert!(left <= t && t <= right);
        assert_eq!(right - left + 1, 29 * SECONDS_PER_DAY); // leap Feb
    }

    #[test]
    fn month_window_crosses_year_boundary() {
        // December 31 should produce a right edge strictly before next January.
        let dec31 = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let t = from_datetime(dec31);
        let right = month_right(t);
        let jan1 = from_datetime(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        assert_eq!(right + 1, jan1);
    }
}
