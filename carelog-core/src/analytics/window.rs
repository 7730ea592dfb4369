//! Time windows and record filtering.
//!
//! A [`TimeRange`] is the symbolic selector the UI offers ("last 30 days");
//! resolving it against an explicit `now` yields a concrete [`TimeWindow`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic reporting range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7days")]
    SevenDays,
    #[default]
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
}

impl TimeRange {
    /// Every range, shortest first.
    pub const ALL: [TimeRange; 5] = [
        TimeRange::SevenDays,
        TimeRange::ThirtyDays,
        TimeRange::ThreeMonths,
        TimeRange::SixMonths,
        TimeRange::OneYear,
    ];

    /// Length of the range in days.
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::SevenDays => 7,
            TimeRange::ThirtyDays => 30,
            TimeRange::ThreeMonths => 90,
            TimeRange::SixMonths => 180,
            TimeRange::OneYear => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::SevenDays => "7days",
            TimeRange::ThirtyDays => "30days",
            TimeRange::ThreeMonths => "3months",
            TimeRange::SixMonths => "6months",
            TimeRange::OneYear => "1year",
        }
    }

    /// Get display name for this range.
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeRange::SevenDays => "Last 7 days",
            TimeRange::ThirtyDays => "Last 30 days",
            TimeRange::ThreeMonths => "Last 3 months",
            TimeRange::SixMonths => "Last 6 months",
            TimeRange::OneYear => "Last year",
        }
    }

    /// Parse a selector, falling back to 30 days for anything unknown.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Resolve against `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        resolve(*self, now)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .iter()
            .copied()
            .find(|range| range.as_str() == s)
            .ok_or_else(|| format!("unknown time range: {}", s))
    }
}

/// Concrete `[start, end]` range, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `ts` lies within the window (both ends inclusive).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Whole calendar days between start and end.
    pub fn duration_days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive())
            .num_days()
            .max(0)
    }

    /// Weeks spanned, rounded up, never less than one.
    pub fn weeks(&self) -> i64 {
        let days = self.duration_days();
        ((days + 6) / 7).max(1)
    }

    /// Same start, no upper bound.
    ///
    /// Used for appointments so bookings after `now` stay visible.
    pub fn open_ended(&self) -> Self {
        Self {
            start: self.start,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }
}

/// Map a symbolic range to `[now - duration, now]`.
pub fn resolve(range: TimeRange, now: DateTime<Utc>) -> TimeWindow {
    TimeWindow {
        start: now - Duration::days(range.days()),
        end: now,
    }
}

/// Select the records whose timestamp falls inside `window`.
///
/// Relative order is preserved and the input is left untouched.
pub fn filter_window<'a, T, I, F>(records: I, timestamp: F, window: &TimeWindow) -> Vec<&'a T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> DateTime<Utc>,
{
    records
        .into_iter()
        .filter(|record| window.contains(timestamp(*record)))
        .collect()
}

/// Window covering the seven days up to and including `now`.
pub(crate) fn last_week(now: DateTime<Utc>) -> TimeWindow {
    resolve(TimeRange::SevenDays, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_resolve_ranges() {
        let window = resolve(TimeRange::SevenDays, now());
        assert_eq!(window.end, now());
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 6, 23, 12, 0, 0).unwrap());
        assert_eq!(window.duration_days(), 7);

        assert_eq!(TimeRange::ThreeMonths.resolve(now()).duration_days(), 90);
        assert_eq!(TimeRange::OneYear.resolve(now()).duration_days(), 365);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let a = resolve(TimeRange::SixMonths, now());
        let b = resolve(TimeRange::SixMonths, now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("7days".parse::<TimeRange>().unwrap(), TimeRange::SevenDays);
        assert_eq!("1year".parse::<TimeRange>().unwrap(), TimeRange::OneYear);
        assert!("fortnight".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::parse_lenient("fortnight"), TimeRange::ThirtyDays);
        assert_eq!(TimeRange::parse_lenient("6months"), TimeRange::SixMonths);
    }

    #[test]
    fn test_weeks_in_window() {
        assert_eq!(TimeRange::SevenDays.resolve(now()).weeks(), 1);
        assert_eq!(TimeRange::ThirtyDays.resolve(now()).weeks(), 5);
        assert_eq!(TimeRange::OneYear.resolve(now()).weeks(), 53);
        assert_eq!(TimeWindow::new(now(), now()).weeks(), 1);
    }

    #[test]
    fn test_filter_is_inclusive_and_ordered() {
        let window = resolve(TimeRange::SevenDays, now());
        let stamps = vec![
            window.end,
            window.start - Duration::seconds(1),
            window.start,
            window.end + Duration::seconds(1),
            window.start + Duration::days(3),
        ];

        let kept = filter_window(&stamps, |ts| *ts, &window);
        assert_eq!(kept, vec![&stamps[0], &stamps[2], &stamps[4]]);
    }

    #[test]
    fn test_filter_empty_cases() {
        let window = resolve(TimeRange::SevenDays, now());
        let empty: Vec<DateTime<Utc>> = vec![];
        assert!(filter_window(&empty, |ts| *ts, &window).is_empty());

        let outside = vec![now() + Duration::days(1), now() - Duration::days(30)];
        assert!(filter_window(&outside, |ts| *ts, &window).is_empty());
    }

    #[test]
    fn test_open_ended_window() {
        let window = resolve(TimeRange::SevenDays, now()).open_ended();
        assert!(window.contains(now() + Duration::days(400)));
        assert!(!window.contains(now() - Duration::days(8)));
    }
}
