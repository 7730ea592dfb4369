//! Analytics for carelog
//!
//! Turns the record store into a period report:
//! - Time windows and record filtering
//! - Pain, exercise, medication and appointment aggregators
//! - Ratings and recommendations
//! - The combined [`HealthReport`]
//!
//! Every function takes `now` explicitly so reports are reproducible.

pub mod appointment;
pub mod exercise;
pub mod insights;
pub mod medication;
pub mod pain;
pub mod report;
pub mod window;

use chrono::Duration;
use std::collections::HashMap;
use std::hash::Hash;

pub use appointment::{summarize_appointments, AppointmentSummary};
pub use exercise::{all_sessions, summarize_exercise, ExerciseSummary};
pub use insights::{
    compose_report, pain_exercise_correlation, recommendations, ActivityRating, AdherenceRating,
    Insights, PainExerciseCorrelation, PainOutlook, Recommendation, RecommendationKind,
    ReportSections, Thresholds,
};
pub use medication::{
    expected_doses, is_on_time, summarize_medications, todays_doses, DoseStatus,
    MedicationSummary, ScheduledDose, DEFAULT_ON_TIME_MINUTES,
};
pub use pain::{summarize_pain, PainSummary, Trend};
pub use report::{generate_report, HealthReport};
pub use window::{filter_window, resolve, TimeRange, TimeWindow};

/// Knobs shared by every aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Length of every "top" ranking
    pub top_n: usize,
    /// How far a dose may drift from its scheduled time and still be on time
    pub on_time_tolerance: Duration,
    pub thresholds: Thresholds,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            on_time_tolerance: Duration::minutes(DEFAULT_ON_TIME_MINUTES),
            thresholds: Thresholds::default(),
        }
    }
}

// ============================================
// Shared helpers
// ============================================

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean; 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// `part / whole` as a whole percentage; 0 when `whole` is 0.
pub(crate) fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

/// Count occurrences, highest count first.
///
/// Ties keep first-seen order.
pub(crate) fn tally<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut order: Vec<K> = Vec::new();
    let mut counts: HashMap<K, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut ranked: Vec<(K, usize)> = order
        .into_iter()
        .map(|k| {
            let count = counts.get(&k).copied().unwrap_or(0);
            (k, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
