use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// The Sunday-to-Saturday local-time interval scoping one render cycle.
/// Recomputed on every call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub tz: Tz,
}

impl WeekWindow {
    /// Computes the week window containing `now` in the target timezone.
    /// Sunday index comes from explicit modulo arithmetic on the Monday=0
    /// weekday number; only the local calendar date feeds the computation,
    /// never the wall-clock time-of-day.
    pub fn containing(now: DateTime<Utc>, tz: Tz) -> Self {
        let local_today = now.with_timezone(&tz).date_naive();
        let days_since_sunday = (local_today.weekday().num_days_from_monday() + 1) % 7;
        let start_date = local_today - Duration::days(i64::from(days_since_sunday));
        let end_date = start_date + Duration::days(6);

        let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("valid fixed time");
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid fixed time");

        Self {
            start: resolve_local(tz, start_date, midnight),
            end: resolve_local(tz, end_date, end_of_day),
            tz,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// Local date of the column at `index` (0 = Sunday).
    pub fn day_date(&self, index: u32) -> NaiveDate {
        self.start_date() + Duration::days(i64::from(index))
    }

    /// Signed day offset of `date` from the window start. Values outside
    /// 0..=6 fall before or after the visible week.
    pub fn day_index_of(&self, date: NaiveDate) -> i64 {
        (date - self.start_date()).num_days()
    }

    /// Window bounds in UTC, for provider queries.
    pub fn utc_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start.with_timezone(&Utc),
            self.end.with_timezone(&Utc),
        )
    }
}

/// Resolves a local wall time in `tz`, stepping forward through DST gaps.
/// Gaps are at most a few hours wide.
fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let mut candidate = date.and_time(time);
    for _ in 0..4 {
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved;
        }
        candidate += Duration::hours(1);
    }
    tz.from_utc_datetime(&date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn utc_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    #[test]
    fn window_starts_on_previous_sunday() {
        // 2026-02-18 is a Wednesday.
        let window = WeekWindow::containing(utc_time("2026-02-18T17:00:00Z"), chrono_tz::US::Eastern);
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
        assert_eq!(window.end_date(), NaiveDate::from_ymd_opt(2026, 2, 21).unwrap());
        assert_eq!(window.start.weekday(), Weekday::Sun);
    }

    #[test]
    fn sunday_maps_to_itself() {
        let window = WeekWindow::containing(utc_time("2026-02-15T12:00:00Z"), chrono_tz::US::Eastern);
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
    }

    #[test]
    fn local_date_decides_the_week_not_the_utc_date() {
        // 01:00 UTC on Sunday is still 20:00 Saturday in US/Eastern, so the
        // window must start on the *previous* Sunday.
        let window = WeekWindow::containing(utc_time("2026-02-15T01:00:00Z"), chrono_tz::US::Eastern);
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2026, 2, 8).unwrap());
    }

    #[test]
    fn dst_transition_week_keeps_midnight_boundary() {
        // US DST begins 2026-03-08 at 02:00 local; Sunday midnight still exists.
        let window = WeekWindow::containing(utc_time("2026-03-11T12:00:00Z"), chrono_tz::US::Eastern);
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
        assert_eq!(window.start.time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(window.end_date(), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
    }

    #[test]
    fn day_index_is_relative_to_window_start() {
        let window = WeekWindow::containing(utc_time("2026-02-18T17:00:00Z"), chrono_tz::US::Eastern);
        assert_eq!(window.day_index_of(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()), 0);
        assert_eq!(window.day_index_of(NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()), 6);
        assert_eq!(window.day_index_of(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()), -1);
        assert_eq!(window.day_index_of(NaiveDate::from_ymd_opt(2026, 2, 22).unwrap()), 7);
    }

    proptest! {
        #[test]
        fn start_is_always_a_local_sunday(epoch_seconds in 0i64..4_102_444_800i64) {
            let now = DateTime::<Utc>::from_timestamp(epoch_seconds, 0).expect("valid timestamp");
            for tz in [
                chrono_tz::US::Eastern,
                chrono_tz::UTC,
                chrono_tz::Asia::Tokyo,
                chrono_tz::Australia::Adelaide,
            ] {
                let window = WeekWindow::containing(now, tz);
                prop_assert_eq!(window.start.weekday(), Weekday::Sun);
                prop_assert_eq!(window.end_date() - window.start_date(), Duration::days(6));
                let today = now.with_timezone(&tz).date_naive();
                let index = window.day_index_of(today);
                prop_assert!((0..=6).contains(&index));
            }
        }
    }
}
