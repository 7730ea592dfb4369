//! Exercise session statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::tally;
use super::window::{last_week, TimeWindow};
use crate::types::{Exercise, ExerciseSession};

/// Totals for one exercise category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub sessions: usize,
    pub minutes: u64,
    pub calories: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCount {
    pub exercise: String,
    pub count: usize,
}

/// Exercise statistics for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    pub total_sessions: usize,
    pub total_minutes: u64,
    pub total_calories: u64,
    /// Sessions per week, rounded to a whole number
    pub avg_sessions_per_week: u32,
    /// Average session length in minutes
    pub avg_session_length: u64,
    pub top_categories: Vec<CategoryStats>,
    pub top_exercises: Vec<ExerciseCount>,
    pub sessions_this_week: usize,
}

/// Every completed session across all exercises, in store order.
pub fn all_sessions(exercises: &[Exercise]) -> Vec<&ExerciseSession> {
    exercises
        .iter()
        .flat_map(|e| e.completed_sessions.iter())
        .collect()
}

fn seconds_to_minutes(seconds: u64) -> u64 {
    (seconds as f64 / 60.0).round() as u64
}

/// Summarize sessions already filtered to `window`.
///
/// Returns `None` when there are no sessions.
pub fn summarize_exercise(
    sessions: &[&ExerciseSession],
    window: &TimeWindow,
    now: DateTime<Utc>,
    top_n: usize,
) -> Option<ExerciseSummary> {
    if sessions.is_empty() {
        return None;
    }

    let total_sessions = sessions.len();
    // Durations come from user data, so sums saturate instead of overflowing
    let total_seconds = sessions
        .iter()
        .fold(0u64, |total, s| total.saturating_add(s.duration));
    let total_minutes = seconds_to_minutes(total_seconds);
    let total_calories: u64 = sessions.iter().map(|s| u64::from(s.calories_burned)).sum();

    let avg_sessions_per_week = (total_sessions as f64 / window.weeks() as f64).round() as u32;
    let avg_session_length = (total_minutes as f64 / total_sessions as f64).round() as u64;

    let top_categories = tally(sessions.iter().map(|s| s.category.as_str()))
        .into_iter()
        .take(top_n)
        .map(|(category, count)| {
            let in_category = sessions.iter().filter(|s| s.category == category);
            let (seconds, calories) = in_category.fold((0u64, 0u64), |(secs, cals), s| {
                (
                    secs.saturating_add(s.duration),
                    cals + u64::from(s.calories_burned),
                )
            });
            CategoryStats {
                category: category.to_string(),
                sessions: count,
                minutes: seconds_to_minutes(seconds),
                calories,
            }
        })
        .collect();

    let top_exercises = tally(sessions.iter().map(|s| s.exercise_name.as_str()))
        .into_iter()
        .take(top_n)
        .map(|(exercise, count)| ExerciseCount {
            exercise: exercise.to_string(),
            count,
        })
        .collect();

    let this_week = last_week(now);
    let sessions_this_week = sessions
        .iter()
        .filter(|s| this_week.contains(s.completed_at))
        .count();

    Some(ExerciseSummary {
        total_sessions,
        total_minutes,
        total_calories,
        avg_sessions_per_week,
        avg_session_length,
        top_categories,
        top_exercises,
        sessions_this_week,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::window::{filter_window, TimeRange};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn session(name: &str, category: &str, minutes: u64, days_ago: i64) -> ExerciseSession {
        ExerciseSession {
            id: format!("{}-{}", name, days_ago),
            exercise_id: name.to_lowercase(),
            exercise_name: name.to_string(),
            category: category.to_string(),
            duration: minutes * 60,
            calories_burned: (minutes * 5) as u32,
            completed_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_empty_is_none() {
        let window = TimeRange::ThirtyDays.resolve(now());
        assert!(summarize_exercise(&[], &window, now(), 5).is_none());
    }

    #[test]
    fn test_totals_and_rates() {
        let sessions = vec![
            session("Walk", "Cardio", 30, 1),
            session("Walk", "Cardio", 20, 3),
            session("Plank", "Strength", 10, 10),
            session("Yoga", "Flexibility", 45, 20),
            session("Walk", "Cardio", 25, 29),
        ];
        let refs: Vec<&ExerciseSession> = sessions.iter().collect();
        let window = TimeRange::ThirtyDays.resolve(now());
        let summary = summarize_exercise(&refs, &window, now(), 5).unwrap();

        assert_eq!(summary.total_sessions, 5);
        assert_eq!(summary.total_minutes, 130);
        assert_eq!(summary.total_calories, 650);
        // 5 sessions over ceil(30 / 7) = 5 weeks
        assert_eq!(summary.avg_sessions_per_week, 1);
        assert_eq!(summary.avg_session_length, 26);
        assert_eq!(summary.sessions_this_week, 2);

        assert_eq!(summary.top_categories[0].category, "Cardio");
        assert_eq!(summary.top_categories[0].sessions, 3);
        assert_eq!(summary.top_categories[0].minutes, 75);
        assert_eq!(summary.top_categories[0].calories, 375);
        assert_eq!(summary.top_categories[1].category, "Strength");

        assert_eq!(summary.top_exercises[0].exercise, "Walk");
        assert_eq!(summary.top_exercises[0].count, 3);
        assert_eq!(summary.top_exercises[1].exercise, "Plank");
    }

    #[test]
    fn test_short_window_counts_one_week() {
        let sessions: Vec<ExerciseSession> =
            (0..6).map(|d| session("Walk", "Cardio", 10, d)).collect();
        let refs: Vec<&ExerciseSession> = sessions.iter().collect();
        let window = TimeRange::SevenDays.resolve(now());
        let summary = summarize_exercise(&refs, &window, now(), 5).unwrap();
        assert_eq!(summary.avg_sessions_per_week, 6);
    }

    #[test]
    fn test_all_sessions_then_filter() {
        let exercises = vec![
            Exercise {
                id: "walk".to_string(),
                name: "Walk".to_string(),
                category: "Cardio".to_string(),
                completed_sessions: vec![
                    session("Walk", "Cardio", 10, 2),
                    session("Walk", "Cardio", 10, 60),
                ],
                total_sessions: 2,
                total_duration: 1200,
                last_completed: None,
            },
            Exercise {
                id: "plank".to_string(),
                name: "Plank".to_string(),
                category: "Strength".to_string(),
                completed_sessions: vec![session("Plank", "Strength", 5, 4)],
                total_sessions: 1,
                total_duration: 300,
                last_completed: None,
            },
        ];

        let sessions = all_sessions(&exercises);
        assert_eq!(sessions.len(), 3);

        let window = TimeRange::ThirtyDays.resolve(now());
        let in_window = filter_window(sessions.iter().copied(), |s| s.completed_at, &window);
        assert_eq!(in_window.len(), 2);
        assert_eq!(in_window[0].exercise_name, "Walk");
        assert_eq!(in_window[1].exercise_name, "Plank");
    }

    #[test]
    fn test_huge_durations_saturate() {
        let mut long = session("Walk", "Cardio", 10, 1);
        long.duration = u64::MAX;
        let sessions = vec![long.clone(), long];
        let refs: Vec<&ExerciseSession> = sessions.iter().collect();
        let window = TimeRange::SevenDays.resolve(now());
        let summary = summarize_exercise(&refs, &window, now(), 5).unwrap();

        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_minutes, seconds_to_minutes(u64::MAX));
        assert_eq!(summary.top_categories[0].minutes, summary.total_minutes);
    }

    #[test]
    fn test_top_n_caps_rankings() {
        let names = ["A", "B", "C", "D", "E", "F"];
        let sessions: Vec<ExerciseSession> = names
            .iter()
            .enumerate()
            .map(|(i, name)| session(name, name, 10, i as i64))
            .collect();
        let refs: Vec<&ExerciseSession> = sessions.iter().collect();
        let window = TimeRange::ThirtyDays.resolve(now());
        let summary = summarize_exercise(&refs, &window, now(), 5).unwrap();
        assert_eq!(summary.top_exercises.len(), 5);
        assert_eq!(summary.top_categories.len(), 5);
        assert_eq!(summary.top_exercises[4].exercise, "E");
    }
}
