//! Medication adherence and dose timing.
//!
//! A dose is on time when it was taken within the tolerance (30 minutes by
//! default) of its scheduled time, in either direction. The same tolerance
//! decides whether a slot in today's schedule is taken, due or overdue.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use super::window::{filter_window, last_week, TimeWindow};
use super::{percentage, round1, tally};
use crate::types::{Dose, Medication};

/// Default on-time tolerance in minutes.
pub const DEFAULT_ON_TIME_MINUTES: i64 = 30;

/// Per-medication dose counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStat {
    pub name: String,
    pub doses: usize,
    /// Percentage of doses taken on time, 0-100
    pub on_time_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffectCount {
    pub effect: String,
    pub count: usize,
}

/// Medication statistics for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSummary {
    pub total_doses: usize,
    pub expected_doses: u64,
    /// Percentage of expected doses recorded, 0-100
    pub adherence_rate: u32,
    pub medication_stats: Vec<MedicationStat>,
    pub top_side_effects: Vec<SideEffectCount>,
    /// One decimal
    pub avg_doses_per_day: f64,
    pub active_medications: usize,
    pub doses_this_week: usize,
    /// Schedule times ignored because they are not `HH:MM`
    pub skipped_schedule_times: usize,
}

/// Whether `dose` was taken within `tolerance` of its scheduled time.
pub fn is_on_time(dose: &Dose, tolerance: Duration) -> bool {
    (dose.timestamp - dose.scheduled_time).abs() <= tolerance
}

/// Whole days the schedule has been running by `now`, stopping after the
/// end date when there is one.
fn schedule_days(medication: &Medication, now: DateTime<Utc>) -> i64 {
    let schedule = &medication.schedule;
    let start = schedule.start_date.and_time(NaiveTime::MIN).and_utc();
    let end = match schedule.end_date {
        Some(end_date) => {
            let after_end = (end_date + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
            after_end.min(now)
        }
        None => now,
    };
    (end - start).num_days().max(0)
}

/// Doses the schedule expects within `window`, plus the number of schedule
/// times that could not be parsed.
pub fn expected_doses(
    medication: &Medication,
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> (u64, usize) {
    let (times, invalid) = medication.schedule.valid_times();
    let days = window.duration_days().min(schedule_days(medication, now));
    (times.len() as u64 * days as u64, invalid)
}

/// Summarize dose history across `medications` for `window`.
///
/// Returns `None` when no dose falls inside the window.
pub fn summarize_medications(
    medications: &[Medication],
    window: &TimeWindow,
    now: DateTime<Utc>,
    tolerance: Duration,
    top_n: usize,
) -> Option<MedicationSummary> {
    let doses_by_medication: Vec<(&Medication, Vec<&Dose>)> = medications
        .iter()
        .map(|m| (m, filter_window(&m.dosage_history, |d| d.timestamp, window)))
        .collect();

    let total_doses: usize = doses_by_medication.iter().map(|(_, d)| d.len()).sum();
    if total_doses == 0 {
        return None;
    }

    let mut expected: u64 = 0;
    let mut skipped_schedule_times = 0;
    for medication in medications {
        let (count, invalid) = expected_doses(medication, window, now);
        expected += count;
        skipped_schedule_times += invalid;
    }
    if skipped_schedule_times > 0 {
        tracing::warn!(
            skipped = skipped_schedule_times,
            "Ignoring schedule times that are not HH:MM"
        );
    }

    let adherence_rate = if expected == 0 {
        0
    } else {
        ((total_doses as f64 * 100.0 / expected as f64).round() as u32).min(100)
    };

    let medication_stats = doses_by_medication
        .iter()
        .map(|(medication, doses)| {
            let on_time = doses.iter().filter(|d| is_on_time(d, tolerance)).count();
            MedicationStat {
                name: medication.name.clone(),
                doses: doses.len(),
                on_time_rate: percentage(on_time, doses.len()),
            }
        })
        .collect();

    let top_side_effects = tally(
        doses_by_medication
            .iter()
            .flat_map(|(_, doses)| doses.iter())
            .flat_map(|d| d.side_effects.iter()),
    )
    .into_iter()
    .take(top_n)
    .map(|(effect, count)| SideEffectCount {
        effect: effect.clone(),
        count,
    })
    .collect();

    let days = window.duration_days();
    let avg_doses_per_day = if days == 0 {
        0.0
    } else {
        round1(total_doses as f64 / days as f64)
    };

    let today = now.date_naive();
    let active_medications = medications
        .iter()
        .filter(|m| m.schedule.covers(today))
        .count();

    let this_week = last_week(now);
    let doses_this_week = doses_by_medication
        .iter()
        .flat_map(|(_, doses)| doses.iter())
        .filter(|d| this_week.contains(d.timestamp))
        .count();

    Some(MedicationSummary {
        total_doses,
        expected_doses: expected,
        adherence_rate,
        medication_stats,
        top_side_effects,
        avg_doses_per_day,
        active_medications,
        doses_this_week,
        skipped_schedule_times,
    })
}

/// State of one scheduled slot today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Taken,
    Due,
    Overdue,
    Upcoming,
}

/// One slot of today's schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDose {
    pub time: NaiveTime,
    pub scheduled_at: DateTime<Utc>,
    pub status: DoseStatus,
    /// The dose that satisfied this slot, if taken
    pub dose_id: Option<String>,
}

/// Today's schedule for `medication`, each slot classified against `now`.
///
/// Empty when the schedule does not cover today.
pub fn todays_doses(
    medication: &Medication,
    now: DateTime<Utc>,
    tolerance: Duration,
) -> Vec<ScheduledDose> {
    let today = now.date_naive();
    if !medication.schedule.covers(today) {
        return Vec::new();
    }

    let (mut times, _) = medication.schedule.valid_times();
    times.sort();

    times
        .into_iter()
        .map(|time| {
            let scheduled_at = today.and_time(time).and_utc();
            let taken = medication
                .dosage_history
                .iter()
                .find(|d| (d.timestamp - scheduled_at).abs() <= tolerance);
            let status = if taken.is_some() {
                DoseStatus::Taken
            } else if (now - scheduled_at).abs() <= tolerance {
                DoseStatus::Due
            } else if now > scheduled_at {
                DoseStatus::Overdue
            } else {
                DoseStatus::Upcoming
            };
            ScheduledDose {
                time,
                scheduled_at,
                status,
                dose_id: taken.map(|d| d.id.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::window::TimeRange;
    use crate::types::MedicationSchedule;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn tolerance() -> Duration {
        Duration::minutes(DEFAULT_ON_TIME_MINUTES)
    }

    fn medication(name: &str, times: &[&str], start: NaiveDate) -> Medication {
        Medication {
            id: name.to_lowercase(),
            name: name.to_string(),
            dosage: "10mg".to_string(),
            schedule: MedicationSchedule {
                frequency: "daily".to_string(),
                times: times.iter().map(|t| t.to_string()).collect(),
                start_date: start,
                end_date: None,
            },
            dosage_history: vec![],
            color: None,
            with_food: false,
            instructions: None,
        }
    }

    fn dose(id: &str, scheduled: DateTime<Utc>, offset_minutes: i64) -> Dose {
        Dose {
            id: id.to_string(),
            timestamp: scheduled + Duration::minutes(offset_minutes),
            scheduled_time: scheduled,
            dosage: "10mg".to_string(),
            notes: None,
            side_effects: vec![],
        }
    }

    fn at_eight(days_ago: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 8, 0, 0).unwrap() - Duration::days(days_ago)
    }

    #[test]
    fn test_on_time_boundary() {
        let scheduled = at_eight(0);
        assert!(is_on_time(&dose("a", scheduled, 30), tolerance()));
        assert!(is_on_time(&dose("b", scheduled, -30), tolerance()));
        assert!(!is_on_time(&dose("c", scheduled, 31), tolerance()));
        assert!(!is_on_time(&dose("d", scheduled, -31), tolerance()));
    }

    #[test]
    fn test_full_adherence() {
        let mut med = medication("Ibuprofen", &["08:00"], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        // One dose a day for the 7 days the window spans.
        med.dosage_history = (0..7).map(|d| dose(&format!("d{}", d), at_eight(d), 5)).collect();

        let window = TimeRange::SevenDays.resolve(now());
        let summary =
            summarize_medications(&[med], &window, now(), tolerance(), 5).unwrap();

        assert_eq!(summary.total_doses, 7);
        assert_eq!(summary.expected_doses, 7);
        assert_eq!(summary.adherence_rate, 100);
        assert_eq!(summary.medication_stats[0].on_time_rate, 100);
        assert_eq!(summary.avg_doses_per_day, 1.0);
        assert_eq!(summary.doses_this_week, 7);
        assert_eq!(summary.active_medications, 1);
    }

    #[test]
    fn test_zero_expected_doses_gives_zero_adherence() {
        // Schedule starts in the future, so nothing is expected yet.
        let mut med = medication("Later", &["08:00"], NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        med.dosage_history = vec![dose("d0", at_eight(1), 0)];

        let window = TimeRange::ThirtyDays.resolve(now());
        let summary =
            summarize_medications(&[med], &window, now(), tolerance(), 5).unwrap();
        assert_eq!(summary.expected_doses, 0);
        assert_eq!(summary.adherence_rate, 0);
        assert_eq!(summary.active_medications, 0);
    }

    #[test]
    fn test_expected_doses_limited_by_schedule_start_and_end() {
        let window = TimeRange::ThirtyDays.resolve(now());

        let recent = medication("Recent", &["08:00", "20:00"], NaiveDate::from_ymd_opt(2024, 6, 25).unwrap());
        // June 25 00:00 to June 30 12:00 is five whole days
        assert_eq!(expected_doses(&recent, &window, now()), (10, 0));

        let old = medication("Old", &["08:00"], NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(expected_doses(&old, &window, now()), (30, 0));

        let mut ended = medication("Ended", &["08:00"], NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        ended.schedule.end_date = Some(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(expected_doses(&ended, &window, now()), (10, 0));

        let broken = medication("Broken", &["08:00", "8am"], NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(expected_doses(&broken, &window, now()), (30, 1));
    }

    #[test]
    fn test_partial_adherence_and_on_time_rate() {
        let mut med = medication("Ibuprofen", &["08:00"], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        med.dosage_history = vec![
            dose("d0", at_eight(0), 10),
            dose("d1", at_eight(1), 45),
            dose("d2", at_eight(2), -20),
            dose("d3", at_eight(3), 90),
        ];

        let window = TimeRange::SevenDays.resolve(now());
        let summary =
            summarize_medications(&[med], &window, now(), tolerance(), 5).unwrap();
        // 4 of 7
        assert_eq!(summary.adherence_rate, 57);
        assert_eq!(summary.medication_stats[0].on_time_rate, 50);
    }

    #[test]
    fn test_no_doses_in_window_is_none() {
        let mut med = medication("Ibuprofen", &["08:00"], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        med.dosage_history = vec![dose("d0", at_eight(60), 0)];
        let window = TimeRange::ThirtyDays.resolve(now());
        assert!(summarize_medications(&[med], &window, now(), tolerance(), 5).is_none());
        assert!(summarize_medications(&[], &window, now(), tolerance(), 5).is_none());
    }

    #[test]
    fn test_stats_cover_every_medication_and_side_effects_rank() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut a = medication("A", &["08:00"], start);
        let b = medication("B", &["09:00"], start);
        let mut first = dose("d0", at_eight(0), 0);
        first.side_effects = vec!["Nausea".to_string(), "Drowsiness".to_string()];
        let mut second = dose("d1", at_eight(1), 0);
        second.side_effects = vec!["Drowsiness".to_string()];
        a.dosage_history = vec![first, second];

        let window = TimeRange::SevenDays.resolve(now());
        let summary =
            summarize_medications(&[a, b], &window, now(), tolerance(), 5).unwrap();

        assert_eq!(summary.medication_stats.len(), 2);
        assert_eq!(summary.medication_stats[1].name, "B");
        assert_eq!(summary.medication_stats[1].doses, 0);
        assert_eq!(summary.medication_stats[1].on_time_rate, 0);
        assert_eq!(summary.top_side_effects[0].effect, "Drowsiness");
        assert_eq!(summary.top_side_effects[0].count, 2);
        assert_eq!(summary.top_side_effects[1].effect, "Nausea");
    }

    #[test]
    fn test_todays_doses_status() {
        let mut med = medication(
            "Ibuprofen",
            &["20:00", "08:00", "11:45", "10:00"],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        med.dosage_history = vec![dose("d0", at_eight(0), 20)];

        let slots = todays_doses(&med, now(), tolerance());
        let statuses: Vec<(String, DoseStatus)> = slots
            .iter()
            .map(|s| (s.time.format("%H:%M").to_string(), s.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("08:00".to_string(), DoseStatus::Taken),
                ("10:00".to_string(), DoseStatus::Overdue),
                ("11:45".to_string(), DoseStatus::Due),
                ("20:00".to_string(), DoseStatus::Upcoming),
            ]
        );
        assert_eq!(slots[0].dose_id.as_deref(), Some("d0"));

        med.schedule.end_date = Some(NaiveDate::from_ymd_opt(2024, 6, 29).unwrap());
        assert!(todays_doses(&med, now(), tolerance()).is_empty());
    }
}
