//! Pain log statistics.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use super::window::{filter_window, last_week};
use super::{mean, round1, tally};
use crate::types::{PainEntry, TimeOfDay};

/// Number of entries in each half of the trend comparison.
pub const TREND_WINDOW: usize = 7;

/// Direction of pain over the most recent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Classify by comparing the recent mean against the older one.
    pub fn from_means(recent: f64, older: f64) -> Self {
        match recent.partial_cmp(&older) {
            Some(Ordering::Greater) => Trend::Increasing,
            Some(Ordering::Less) => Trend::Decreasing,
            _ => Trend::Stable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCount {
    pub trigger: String,
    pub count: usize,
}

/// Average pain for entries logged in one part of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDayPain {
    pub time: TimeOfDay,
    pub avg_pain: f64,
    pub entries: usize,
}

/// How often the user tagged an entry with a part of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDayCount {
    pub time: TimeOfDay,
    pub count: usize,
}

/// Pain statistics for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PainSummary {
    pub total_entries: usize,
    /// Mean level, one decimal
    pub avg_pain_level: f64,
    pub max_pain_level: u8,
    pub min_pain_level: u8,
    /// Mean level across the whole history, one decimal
    pub all_time_avg_pain_level: f64,
    pub trend: Trend,
    /// Recent mean minus older mean, one decimal
    pub trend_value: f64,
    /// Most frequent triggers, highest first
    pub top_triggers: Vec<TriggerCount>,
    /// Average pain by hour-of-day bucket, highest first
    pub time_of_day_analysis: Vec<TimeOfDayPain>,
    /// Tally of the reported time of day, highest first
    pub time_of_day_counts: Vec<TimeOfDayCount>,
    pub entries_this_week: usize,
    /// Entries ignored because their level was outside 1..=10
    pub skipped_entries: usize,
}

/// Summarize pain entries already filtered to a window.
///
/// `history` is the full, unfiltered log and feeds the all-time average and
/// the weekly count. Returns `None` when no valid entry is left.
pub fn summarize_pain(
    filtered: &[&PainEntry],
    history: &[PainEntry],
    now: DateTime<Utc>,
    top_n: usize,
) -> Option<PainSummary> {
    let valid: Vec<&PainEntry> = filtered
        .iter()
        .copied()
        .filter(|e| e.has_valid_level())
        .collect();
    let skipped_entries = filtered.len() - valid.len();
    if skipped_entries > 0 {
        tracing::warn!(
            skipped = skipped_entries,
            "Ignoring pain entries with out-of-range levels"
        );
    }
    if valid.is_empty() {
        return None;
    }

    let levels: Vec<f64> = valid.iter().map(|e| f64::from(e.level)).collect();
    let max_pain_level = valid.iter().map(|e| e.level).max().unwrap_or(0);
    let min_pain_level = valid.iter().map(|e| e.level).min().unwrap_or(0);

    let history_levels: Vec<f64> = history
        .iter()
        .filter(|e| e.has_valid_level())
        .map(|e| f64::from(e.level))
        .collect();

    let (trend, trend_value) = pain_trend(&valid);

    let top_triggers = tally(valid.iter().flat_map(|e| e.triggers.iter()))
        .into_iter()
        .take(top_n)
        .map(|(trigger, count)| TriggerCount {
            trigger: trigger.clone(),
            count,
        })
        .collect();

    let time_of_day_counts = tally(valid.iter().map(|e| e.time_of_day))
        .into_iter()
        .map(|(time, count)| TimeOfDayCount { time, count })
        .collect();

    let entries_this_week = filter_window(history, |e| e.timestamp, &last_week(now))
        .into_iter()
        .filter(|e| e.has_valid_level())
        .count();

    Some(PainSummary {
        total_entries: valid.len(),
        avg_pain_level: round1(mean(&levels)),
        max_pain_level,
        min_pain_level,
        all_time_avg_pain_level: round1(mean(&history_levels)),
        trend,
        trend_value,
        top_triggers,
        time_of_day_analysis: time_of_day_analysis(&valid),
        time_of_day_counts,
        entries_this_week,
        skipped_entries,
    })
}

/// Compare the last [`TREND_WINDOW`] entries against the ones before them.
///
/// Entries are ordered by timestamp, then split by position, not by calendar
/// week. A half with no entries has a mean of 0.
fn pain_trend(entries: &[&PainEntry]) -> (Trend, f64) {
    let mut ordered = entries.to_vec();
    ordered.sort_by_key(|e| e.timestamp);

    let levels: Vec<f64> = ordered.iter().map(|e| f64::from(e.level)).collect();
    let split = levels.len().saturating_sub(TREND_WINDOW);
    let recent = mean(&levels[split..]);
    let older = mean(&levels[split.saturating_sub(TREND_WINDOW)..split]);

    (Trend::from_means(recent, older), round1(recent - older))
}

/// Average level per hour-of-day bucket, taken from the entry timestamp.
fn time_of_day_analysis(entries: &[&PainEntry]) -> Vec<TimeOfDayPain> {
    let mut buckets: Vec<(TimeOfDay, f64, usize)> = Vec::new();
    for entry in entries {
        let time = TimeOfDay::from_hour(entry.timestamp.hour());
        match buckets.iter_mut().find(|(t, _, _)| *t == time) {
            Some((_, sum, count)) => {
                *sum += f64::from(entry.level);
                *count += 1;
            }
            None => buckets.push((time, f64::from(entry.level), 1)),
        }
    }

    let mut analysis: Vec<TimeOfDayPain> = buckets
        .into_iter()
        .map(|(time, sum, entries)| TimeOfDayPain {
            time,
            avg_pain: round1(sum / entries as f64),
            entries,
        })
        .collect();
    analysis.sort_by(|a, b| {
        b.avg_pain
            .partial_cmp(&a.avg_pain)
            .unwrap_or(Ordering::Equal)
    });
    analysis
}
