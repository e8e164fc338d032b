//! Weekly reset clock. Pure boundary arithmetic, no I/O.
//!
//! The reset cadence is weekly, anchored to Tuesday 10:00 UTC. Boundaries
//! are recomputed from `now` on every call — nothing is cached, so there
//! is no drift near the boundary.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};

/// Day of week the weekly reset lands on.
pub const RESET_WEEKDAY: Weekday = Weekday::Tue;

/// Hour of day (UTC) the weekly reset lands on.
pub const RESET_HOUR_UTC: u32 = 10;

/// Most recent reset boundary at or before `now` (boundary-inclusive:
/// exactly at the anchor instant returns that instant).
///
/// On the anchor weekday before the anchor hour the candidate boundary
/// lies in the future, so it falls back a full week to the previous reset.
pub fn current_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_back = (i64::from(now.weekday().num_days_from_monday())
        - i64::from(RESET_WEEKDAY.num_days_from_monday()))
    .rem_euclid(7);
    let anchor_midnight = (now.date_naive() - Duration::days(days_back))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let candidate = anchor_midnight + Duration::hours(i64::from(RESET_HOUR_UTC));
    if candidate > now {
        candidate - Duration::weeks(1)
    } else {
        candidate
    }
}

/// Boundary one week before [`current_reset`].
pub fn previous_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    current_reset(now) - Duration::weeks(1)
}

/// Boundary one week after [`current_reset`].
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    current_reset(now) + Duration::weeks(1)
}

/// True iff a reset boundary has passed since `last_checked`. The check
/// is boundary-relative, so a late or missed poll still detects it.
pub fn is_past_reset_since(now: DateTime<Utc>, last_checked: DateTime<Utc>) -> bool {
    current_reset(now) > last_checked
}

/// True iff this calendar week's reset has already happened, i.e. at any
/// time except the anchor weekday before the anchor hour.
pub fn is_reset_time(now: DateTime<Utc>) -> bool {
    !(now.weekday() == RESET_WEEKDAY && now.hour() < RESET_HOUR_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    // 2025-07-01 is a Tuesday.
    const ANCHOR: (i32, u32, u32) = (2025, 7, 1);

    #[test]
    fn boundary_is_inclusive_at_anchor_instant() {
        let exactly = utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, RESET_HOUR_UTC, 0, 0);
        assert_eq!(current_reset(exactly), exactly);
    }

    #[test]
    fn one_second_before_anchor_falls_back_a_week() {
        let just_before = utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, RESET_HOUR_UTC - 1, 59, 59);
        let expected = utc(2025, 6, 24, RESET_HOUR_UTC, 0, 0);
        assert_eq!(current_reset(just_before), expected);
    }

    #[test]
    fn mid_week_returns_most_recent_tuesday() {
        // Friday afternoon.
        let friday = utc(2025, 7, 4, 18, 30, 0);
        assert_eq!(
            current_reset(friday),
            utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, RESET_HOUR_UTC, 0, 0)
        );
    }

    #[test]
    fn monday_still_belongs_to_previous_week() {
        let monday = utc(2025, 7, 7, 9, 0, 0);
        assert_eq!(
            current_reset(monday),
            utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, RESET_HOUR_UTC, 0, 0)
        );
    }

    #[test]
    fn previous_and_next_are_one_week_apart() {
        let now = utc(2025, 7, 4, 12, 0, 0);
        let current = current_reset(now);
        assert_eq!(previous_reset(now), current - Duration::weeks(1));
        assert_eq!(next_reset(now), current + Duration::weeks(1));
    }

    #[test]
    fn boundary_is_monotonic_across_the_anchor() {
        let before = utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, RESET_HOUR_UTC - 1, 0, 0);
        let after = utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, RESET_HOUR_UTC, 0, 1);
        assert!(current_reset(before) < current_reset(after));
    }

    #[test]
    fn past_reset_detection_is_boundary_relative() {
        let last_checked = utc(2025, 6, 24, RESET_HOUR_UTC, 0, 0);
        // Still the same week: nothing new.
        assert!(!is_past_reset_since(utc(2025, 6, 30, 23, 0, 0), last_checked));
        // Hours after the next boundary, even if polls were missed.
        assert!(is_past_reset_since(utc(2025, 7, 1, 14, 0, 0), last_checked));
    }

    #[test]
    fn reset_time_is_false_only_before_the_anchor_hour_on_tuesday() {
        assert!(!is_reset_time(utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, 9, 59, 59)));
        assert!(is_reset_time(utc(ANCHOR.0, ANCHOR.1, ANCHOR.2, 10, 0, 0)));
        assert!(is_reset_time(utc(2025, 7, 2, 0, 0, 0)));
        assert!(is_reset_time(utc(2025, 6, 30, 8, 0, 0)));
    }
}
