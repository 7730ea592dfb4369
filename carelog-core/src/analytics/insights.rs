//! Insight composition: recommendations, qualitative ratings and the
//! pain/exercise correlation.
//!
//! Everything here is a pure function of aggregator output, so the same
//! sections always produce the same report.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use super::appointment::AppointmentSummary;
use super::exercise::ExerciseSummary;
use super::medication::MedicationSummary;
use super::pain::{PainSummary, Trend};
use super::report::HealthReport;
use super::window::{TimeRange, TimeWindow};
use super::{mean, round1};
use crate::types::{ExerciseSession, PainEntry};

/// Thresholds that drive recommendations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Average pain above this is flagged
    pub high_pain_level: f64,
    /// Fewer weekly sessions than this is flagged
    pub min_sessions_per_week: u32,
    /// Adherence below this percentage is flagged
    pub min_adherence_rate: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_pain_level: 6.0,
            min_sessions_per_week: 3,
            min_adherence_rate: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ConsultProvider,
    HighPain,
    IncreaseExercise,
    ImproveAdherence,
    KeepItUp,
}

impl RecommendationKind {
    /// Text shown to the user, quoting the threshold where one applies.
    pub fn message(&self, thresholds: &Thresholds) -> String {
        let text = match self {
            RecommendationKind::ConsultProvider => {
                "Your pain levels are trending upward. Consider consulting your healthcare provider."
            }
            RecommendationKind::HighPain => {
                "Your average pain level is high. Discuss pain management options with your provider."
            }
            RecommendationKind::IncreaseExercise => {
                return format!(
                    "Try to increase your exercise frequency to at least {} sessions per week.",
                    thresholds.min_sessions_per_week
                );
            }
            RecommendationKind::ImproveAdherence => {
                "Your medication adherence could be improved. Consider setting reminders for your doses."
            }
            RecommendationKind::KeepItUp => {
                "Great job! Keep up your current health routine."
            }
        };
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, thresholds: &Thresholds) -> Self {
        Self {
            kind,
            message: kind.message(thresholds),
        }
    }
}

/// Where pain is heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PainOutlook {
    Improving,
    Stable,
    Worsening,
}

impl PainOutlook {
    pub fn label(&self) -> &'static str {
        match self {
            PainOutlook::Improving => "Improving",
            PainOutlook::Stable => "Stable",
            PainOutlook::Worsening => "Worsening",
        }
    }
}

impl From<Trend> for PainOutlook {
    fn from(trend: Trend) -> Self {
        match trend {
            Trend::Decreasing => PainOutlook::Improving,
            Trend::Stable => PainOutlook::Stable,
            Trend::Increasing => PainOutlook::Worsening,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceRating {
    Excellent,
    Good,
    NeedsImprovement,
}

impl AdherenceRating {
    pub fn label(&self) -> &'static str {
        match self {
            AdherenceRating::Excellent => "Excellent",
            AdherenceRating::Good => "Good",
            AdherenceRating::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityRating {
    OnTrack,
    NeedsImprovement,
}

impl ActivityRating {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityRating::OnTrack => "On Track",
            ActivityRating::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Mean pain on days with and without exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PainExerciseCorrelation {
    /// One decimal
    pub avg_pain_exercise_days: f64,
    /// One decimal
    pub avg_pain_rest_days: f64,
    pub exercise_days: usize,
    pub rest_days: usize,
}

impl PainExerciseCorrelation {
    /// Rest-day pain minus exercise-day pain; positive means exercise days
    /// hurt less.
    pub fn difference(&self) -> f64 {
        round1(self.avg_pain_rest_days - self.avg_pain_exercise_days)
    }
}

/// Qualitative labels derived from the sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub pain_outlook: Option<PainOutlook>,
    pub adherence_rating: Option<AdherenceRating>,
    pub activity_rating: Option<ActivityRating>,
    pub pain_exercise: Option<PainExerciseCorrelation>,
}

/// Aggregator output for one window; any section may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSections {
    pub pain: Option<PainSummary>,
    pub exercise: Option<ExerciseSummary>,
    pub medication: Option<MedicationSummary>,
    pub appointments: Option<AppointmentSummary>,
    pub pain_exercise: Option<PainExerciseCorrelation>,
}

/// Threshold rules, evaluated in a fixed order.
pub fn recommendations(sections: &ReportSections, thresholds: &Thresholds) -> Vec<Recommendation> {
    let mut kinds = Vec::new();

    if let Some(pain) = &sections.pain {
        if pain.trend == Trend::Increasing {
            kinds.push(RecommendationKind::ConsultProvider);
        }
        if pain.avg_pain_level > thresholds.high_pain_level {
            kinds.push(RecommendationKind::HighPain);
        }
    }
    if let Some(exercise) = &sections.exercise {
        if exercise.avg_sessions_per_week < thresholds.min_sessions_per_week {
            kinds.push(RecommendationKind::IncreaseExercise);
        }
    }
    if let Some(medication) = &sections.medication {
        if medication.adherence_rate < thresholds.min_adherence_rate {
            kinds.push(RecommendationKind::ImproveAdherence);
        }
    }
    if kinds.is_empty() {
        kinds.push(RecommendationKind::KeepItUp);
    }

    kinds
        .into_iter()
        .map(|kind| Recommendation::new(kind, thresholds))
        .collect()
}

/// Ratings for each section that has data.
pub fn insights(sections: &ReportSections, thresholds: &Thresholds) -> Insights {
    Insights {
        pain_outlook: sections.pain.as_ref().map(|p| PainOutlook::from(p.trend)),
        adherence_rating: sections.medication.as_ref().map(|m| {
            if m.adherence_rate >= 90 {
                AdherenceRating::Excellent
            } else if m.adherence_rate >= thresholds.min_adherence_rate {
                AdherenceRating::Good
            } else {
                AdherenceRating::NeedsImprovement
            }
        }),
        activity_rating: sections.exercise.as_ref().map(|e| {
            if e.avg_sessions_per_week >= thresholds.min_sessions_per_week {
                ActivityRating::OnTrack
            } else {
                ActivityRating::NeedsImprovement
            }
        }),
        pain_exercise: sections.pain_exercise.clone(),
    }
}

/// Compare pain on days with at least one session against the other days.
///
/// Days are UTC calendar days. Returns `None` unless both groups have
/// entries.
pub fn pain_exercise_correlation(
    pain: &[&PainEntry],
    sessions: &[&ExerciseSession],
) -> Option<PainExerciseCorrelation> {
    let active_days: HashSet<NaiveDate> = sessions
        .iter()
        .map(|s| s.completed_at.date_naive())
        .collect();

    let mut exercise_levels = Vec::new();
    let mut rest_levels = Vec::new();
    let mut exercise_days = HashSet::new();
    let mut rest_days = HashSet::new();
    for entry in pain.iter().filter(|e| e.has_valid_level()) {
        let day = entry.timestamp.date_naive();
        if active_days.contains(&day) {
            exercise_levels.push(f64::from(entry.level));
            exercise_days.insert(day);
        } else {
            rest_levels.push(f64::from(entry.level));
            rest_days.insert(day);
        }
    }

    if exercise_levels.is_empty() || rest_levels.is_empty() {
        return None;
    }

    Some(PainExerciseCorrelation {
        avg_pain_exercise_days: round1(mean(&exercise_levels)),
        avg_pain_rest_days: round1(mean(&rest_levels)),
        exercise_days: exercise_days.len(),
        rest_days: rest_days.len(),
    })
}

/// Merge the sections into one report with ratings and recommendations.
pub fn compose_report(
    sections: ReportSections,
    range: TimeRange,
    window: TimeWindow,
    thresholds: &Thresholds,
) -> HealthReport {
    let insights = insights(&sections, thresholds);
    let recommendations = recommendations(&sections, thresholds);

    HealthReport {
        range,
        window,
        generated_at: window.end,
        pain: sections.pain,
        exercise: sections.exercise,
        medication: sections.medication,
        appointments: sections.appointments,
        insights,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeOfDay;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn pain_summary(avg: f64, trend: Trend) -> PainSummary {
        PainSummary {
            total_entries: 3,
            avg_pain_level: avg,
            max_pain_level: 8,
            min_pain_level: 2,
            all_time_avg_pain_level: avg,
            trend,
            trend_value: 0.0,
            top_triggers: vec![],
            time_of_day_analysis: vec![],
            time_of_day_counts: vec![],
            entries_this_week: 3,
            skipped_entries: 0,
        }
    }

    fn exercise_summary(per_week: u32) -> ExerciseSummary {
        ExerciseSummary {
            total_sessions: 10,
            total_minutes: 300,
            total_calories: 1500,
            avg_sessions_per_week: per_week,
            avg_session_length: 30,
            top_categories: vec![],
            top_exercises: vec![],
            sessions_this_week: 2,
        }
    }

    fn medication_summary(adherence: u32) -> MedicationSummary {
        MedicationSummary {
            total_doses: 20,
            expected_doses: 30,
            adherence_rate: adherence,
            medication_stats: vec![],
            top_side_effects: vec![],
            avg_doses_per_day: 0.7,
            active_medications: 1,
            doses_this_week: 5,
            skipped_schedule_times: 0,
        }
    }

    fn kinds(sections: &ReportSections) -> Vec<RecommendationKind> {
        recommendations(sections, &Thresholds::default())
            .into_iter()
            .map(|r| r.kind)
            .collect()
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let sections = ReportSections {
            pain: Some(pain_summary(7.2, Trend::Increasing)),
            exercise: Some(exercise_summary(1)),
            medication: Some(medication_summary(60)),
            ..Default::default()
        };
        assert_eq!(
            kinds(&sections),
            vec![
                RecommendationKind::ConsultProvider,
                RecommendationKind::HighPain,
                RecommendationKind::IncreaseExercise,
                RecommendationKind::ImproveAdherence,
            ]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let sections = ReportSections {
            pain: Some(pain_summary(6.0, Trend::Stable)),
            exercise: Some(exercise_summary(3)),
            medication: Some(medication_summary(80)),
            ..Default::default()
        };
        assert_eq!(kinds(&sections), vec![RecommendationKind::KeepItUp]);
    }

    #[test]
    fn test_empty_sections_encourage() {
        let recs = recommendations(&ReportSections::default(), &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::KeepItUp);
        assert_eq!(
            recs[0].message,
            RecommendationKind::KeepItUp.message(&Thresholds::default())
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds {
            high_pain_level: 4.0,
            min_sessions_per_week: 5,
            min_adherence_rate: 95,
        };
        let sections = ReportSections {
            pain: Some(pain_summary(5.0, Trend::Decreasing)),
            exercise: Some(exercise_summary(4)),
            medication: Some(medication_summary(90)),
            ..Default::default()
        };
        let recs = recommendations(&sections, &thresholds);
        let kinds: Vec<RecommendationKind> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::HighPain,
                RecommendationKind::IncreaseExercise,
                RecommendationKind::ImproveAdherence,
            ]
        );
        assert_eq!(
            recs[1].message,
            "Try to increase your exercise frequency to at least 5 sessions per week."
        );
    }

    #[test]
    fn test_exercise_message_quotes_threshold() {
        let sections = ReportSections {
            exercise: Some(exercise_summary(1)),
            ..Default::default()
        };
        let recs = recommendations(&sections, &Thresholds::default());
        assert_eq!(recs[0].kind, RecommendationKind::IncreaseExercise);
        assert!(recs[0].message.contains("at least 3 sessions per week"));
    }

    #[test]
    fn test_ratings() {
        let sections = ReportSections {
            pain: Some(pain_summary(3.0, Trend::Decreasing)),
            exercise: Some(exercise_summary(2)),
            medication: Some(medication_summary(92)),
            ..Default::default()
        };
        let labels = insights(&sections, &Thresholds::default());
        assert_eq!(labels.pain_outlook, Some(PainOutlook::Improving));
        assert_eq!(labels.adherence_rating, Some(AdherenceRating::Excellent));
        assert_eq!(labels.activity_rating, Some(ActivityRating::NeedsImprovement));

        let sections = ReportSections {
            medication: Some(medication_summary(85)),
            ..Default::default()
        };
        let labels = insights(&sections, &Thresholds::default());
        assert_eq!(labels.pain_outlook, None);
        assert_eq!(labels.adherence_rating, Some(AdherenceRating::Good));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let sections = ReportSections {
            pain: Some(pain_summary(7.0, Trend::Increasing)),
            ..Default::default()
        };
        let window = TimeRange::ThirtyDays.resolve(now());
        let a = compose_report(sections.clone(), TimeRange::ThirtyDays, window, &Thresholds::default());
        let b = compose_report(sections, TimeRange::ThirtyDays, window, &Thresholds::default());
        assert_eq!(a, b);
        assert!(a.exercise.is_none());
        assert_eq!(a.recommendations.len(), 2);
    }

    fn pain_at(level: u8, ts: DateTime<Utc>) -> PainEntry {
        PainEntry {
            id: ts.to_rfc3339(),
            timestamp: ts,
            level,
            location: None,
            pain_type: None,
            triggers: vec![],
            symptoms: vec![],
            time_of_day: TimeOfDay::Morning,
            weather: None,
            activities: None,
            notes: None,
        }
    }

    fn session_at(ts: DateTime<Utc>) -> ExerciseSession {
        ExerciseSession {
            id: ts.to_rfc3339(),
            exercise_id: "walk".to_string(),
            exercise_name: "Walk".to_string(),
            category: "Cardio".to_string(),
            duration: 1200,
            calories_burned: 80,
            completed_at: ts,
        }
    }

    #[test]
    fn test_pain_exercise_correlation() {
        let day = |d: i64| now() - Duration::days(d);
        let pain = vec![
            pain_at(3, day(1)),
            pain_at(4, day(1) + Duration::hours(2)),
            pain_at(7, day(2)),
            pain_at(6, day(3)),
        ];
        let sessions = vec![session_at(day(1) - Duration::hours(3))];
        let pain_refs: Vec<&PainEntry> = pain.iter().collect();
        let session_refs: Vec<&ExerciseSession> = sessions.iter().collect();

        let correlation = pain_exercise_correlation(&pain_refs, &session_refs).unwrap();
        assert_eq!(correlation.avg_pain_exercise_days, 3.5);
        assert_eq!(correlation.avg_pain_rest_days, 6.5);
        assert_eq!(correlation.exercise_days, 1);
        assert_eq!(correlation.rest_days, 2);
        assert_eq!(correlation.difference(), 3.0);

        assert!(pain_exercise_correlation(&pain_refs, &[]).is_none());
        assert!(pain_exercise_correlation(&[], &session_refs).is_none());
    }
}
