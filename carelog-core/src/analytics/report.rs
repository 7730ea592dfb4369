//! The combined health report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::appointment::{summarize_appointments, AppointmentSummary};
use super::exercise::{all_sessions, summarize_exercise, ExerciseSummary};
use super::insights::{
    compose_report, pain_exercise_correlation, Insights, Recommendation, ReportSections,
};
use super::medication::{summarize_medications, MedicationSummary};
use super::pain::{summarize_pain, PainSummary};
use super::window::{filter_window, TimeRange, TimeWindow};
use super::ReportSettings;
use crate::store::RecordStore;

/// Everything the tracker reports for one range.
///
/// A section is `None` when the window holds no data for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub range: TimeRange,
    pub window: TimeWindow,
    pub generated_at: DateTime<Utc>,
    pub pain: Option<PainSummary>,
    pub exercise: Option<ExerciseSummary>,
    pub medication: Option<MedicationSummary>,
    pub appointments: Option<AppointmentSummary>,
    pub insights: Insights,
    pub recommendations: Vec<Recommendation>,
}

impl HealthReport {
    /// Whether no section has data.
    pub fn is_empty(&self) -> bool {
        self.pain.is_none()
            && self.exercise.is_none()
            && self.medication.is_none()
            && self.appointments.is_none()
    }
}

/// Build the report for `range` ending at `now`.
///
/// Appointments use an open-ended window so future bookings are included.
pub fn generate_report(
    store: &RecordStore,
    range: TimeRange,
    now: DateTime<Utc>,
    settings: &ReportSettings,
) -> HealthReport {
    let window = range.resolve(now);

    let pain = filter_window(&store.pain_entries, |e| e.timestamp, &window);
    let sessions = all_sessions(&store.exercises);
    let sessions = filter_window(sessions.iter().copied(), |s| s.completed_at, &window);
    let appointments = filter_window(&store.appointments, |a| a.date_time, &window.open_ended());

    tracing::debug!(
        range = %range,
        pain = pain.len(),
        sessions = sessions.len(),
        appointments = appointments.len(),
        "Generating report"
    );

    let sections = ReportSections {
        pain: summarize_pain(&pain, &store.pain_entries, now, settings.top_n),
        exercise: summarize_exercise(&sessions, &window, now, settings.top_n),
        medication: summarize_medications(
            &store.medications,
            &window,
            now,
            settings.on_time_tolerance,
            settings.top_n,
        ),
        appointments: summarize_appointments(
            &appointments,
            &store.providers,
            now,
            settings.top_n,
        ),
        pain_exercise: pain_exercise_correlation(&pain, &sessions),
    };

    compose_report(sections, range, window, &settings.thresholds)
}
