//! Core domain types for carelog
//!
//! These types mirror the records the tracking app keeps for a single user
//! profile. Field names serialize as camelCase so a browser store export
//! loads without translation.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Pain entry** | One logged pain observation with a 1-10 level |
//! | **Exercise** | A named routine; owns the sessions completed for it |
//! | **Session** | One completed workout of an exercise |
//! | **Medication** | A prescribed drug with a daily schedule |
//! | **Dose** | One recorded intake of a medication |
//! | **Appointment** | A visit booked with a provider |
//! | **Provider** | A clinician or practice |
//!
//! Records are append-mostly. "Past" vs "upcoming" appointments and
//! "active" medications are derived from `now`, never stored.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest valid pain level.
pub const MIN_PAIN_LEVEL: u8 = 1;
/// Highest valid pain level.
pub const MAX_PAIN_LEVEL: u8 = 10;

// ============================================
// Record kinds
// ============================================

/// The collections held by a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Pain,
    Exercise,
    Session,
    Medication,
    Dose,
    Appointment,
    Provider,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Pain => "pain",
            RecordKind::Exercise => "exercise",
            RecordKind::Session => "session",
            RecordKind::Medication => "medication",
            RecordKind::Dose => "dose",
            RecordKind::Appointment => "appointment",
            RecordKind::Provider => "provider",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pain" => Ok(RecordKind::Pain),
            "exercise" => Ok(RecordKind::Exercise),
            "session" => Ok(RecordKind::Session),
            "medication" => Ok(RecordKind::Medication),
            "dose" => Ok(RecordKind::Dose),
            "appointment" => Ok(RecordKind::Appointment),
            "provider" => Ok(RecordKind::Provider),
            _ => Err(format!("unknown record kind: {}", s)),
        }
    }
}

// ============================================
// Pain
// ============================================

/// Part of the day the user reported the pain in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket an hour of the day (0-23).
    ///
    /// Night 0-5, Morning 6-11, Afternoon 12-17, Evening 18-23.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimeOfDay::Night,
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    /// Display label (e.g., "Morning").
    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }
}

/// A single logged pain observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Pain level, valid range 1..=10
    pub level: u8,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "type")]
    pub pain_type: Option<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub activities: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PainEntry {
    /// Whether `level` lies within 1..=10.
    pub fn has_valid_level(&self) -> bool {
        (MIN_PAIN_LEVEL..=MAX_PAIN_LEVEL).contains(&self.level)
    }
}

// ============================================
// Exercise
// ============================================

/// One completed workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSession {
    pub id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub category: String,
    /// Duration in seconds
    pub duration: u64,
    #[serde(default)]
    pub calories_burned: u32,
    pub completed_at: DateTime<Utc>,
}

/// An exercise routine and its session log.
///
/// `total_sessions` and `total_duration` are denormalized from
/// `completed_sessions` and must agree with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub completed_sessions: Vec<ExerciseSession>,
    #[serde(default)]
    pub total_sessions: u32,
    /// Sum of session durations in seconds
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub last_completed: Option<DateTime<Utc>>,
}

impl Exercise {
    /// Whether the denormalized totals agree with the session log.
    pub fn totals_consistent(&self) -> bool {
        self.total_sessions as usize == self.completed_sessions.len()
            && self.total_duration == self.session_duration_sum()
    }

    /// Recompute totals and `last_completed` from the session log.
    pub fn recompute_totals(&mut self) {
        self.total_sessions = self.completed_sessions.len() as u32;
        self.total_duration = self.session_duration_sum();
        self.last_completed = self.completed_sessions.iter().map(|s| s.completed_at).max();
    }

    /// Saturates rather than wrapping on corrupt durations.
    fn session_duration_sum(&self) -> u64 {
        self.completed_sessions
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.duration))
    }
}

// ============================================
// Medication
// ============================================

/// Parse a schedule time in `HH:MM` form.
pub fn parse_schedule_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// When a medication should be taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSchedule {
    /// Free-form frequency label (e.g., "twice daily")
    pub frequency: String,
    /// Times of day in `HH:MM`
    #[serde(default)]
    pub times: Vec<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl MedicationSchedule {
    /// Scheduled times that parse as `HH:MM`, plus the count that don't.
    pub fn valid_times(&self) -> (Vec<NaiveTime>, usize) {
        let mut valid = Vec::with_capacity(self.times.len());
        let mut invalid = 0;
        for raw in &self.times {
            match parse_schedule_time(raw) {
                Some(time) => valid.push(time),
                None => invalid += 1,
            }
        }
        (valid, invalid)
    }

    /// Whether the schedule is in effect on `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| date <= end)
    }
}

/// One recorded intake of a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dose {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub scheduled_time: DateTime<Utc>,
    pub dosage: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
}

/// A prescribed medication and its dose history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub schedule: MedicationSchedule,
    #[serde(default)]
    pub dosage_history: Vec<Dose>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub with_food: bool,
    #[serde(default)]
    pub instructions: Option<String>,
}

// ============================================
// Appointments & providers
// ============================================

/// Booking state of an appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

/// A visit booked with a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub provider_id: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub date_time: DateTime<Utc>,
    /// Duration in minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub preparation: Vec<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Whether the appointment lies after `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date_time > now
    }
}

/// A clinician or practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub practice: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub accepted_insurance: Vec<String>,
    /// Rating 1..=5
    #[serde(default)]
    pub rating: Option<u8>,
}
