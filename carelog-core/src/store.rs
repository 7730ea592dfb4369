//! Record store: the user's health log, keyed by record kind.
//!
//! The store is the validation boundary. Records are parsed one at a time
//! when loaded, so a single malformed record is dropped and reported in a
//! [`LoadReport`] instead of failing the whole load. Analytics treat the
//! store as read-only input; the write operations here are the single
//! update path that keeps denormalized fields consistent.

use crate::error::{Error, Result};
use crate::types::{
    Appointment, Dose, Exercise, ExerciseSession, Medication, PainEntry, Provider, RecordKind,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Every collection the tracker keeps for one user.
///
/// Insertion order is entry order, which is not necessarily timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStore {
    #[serde(default)]
    pub pain_entries: Vec<PainEntry>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub providers: Vec<Provider>,
}

/// Untyped view of a store document, parsed record by record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStore {
    #[serde(default)]
    pain_entries: Vec<Value>,
    #[serde(default)]
    exercises: Vec<Value>,
    #[serde(default)]
    medications: Vec<Value>,
    #[serde(default)]
    appointments: Vec<Value>,
    #[serde(default)]
    providers: Vec<Value>,
}

/// A problem found with one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordIssue {
    pub kind: RecordKind,
    /// Position in its collection (or in the parent's child list)
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

impl RecordIssue {
    fn new(kind: RecordKind, index: usize, id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            id: id.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Outcome of [`RecordStore::load_from`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Records kept (including repaired ones)
    pub loaded: usize,
    /// Records dropped because they could not be parsed or were invalid
    pub skipped: Vec<RecordIssue>,
    /// Records kept after their derived fields were recomputed
    pub repaired: Vec<RecordIssue>,
}

impl LoadReport {
    /// Whether every record loaded untouched.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.repaired.is_empty()
    }
}

fn pain_issue(entry: &PainEntry) -> Option<String> {
    if entry.has_valid_level() {
        None
    } else {
        Some(format!("pain level {} outside 1..=10", entry.level))
    }
}

fn provider_issue(provider: &Provider) -> Option<String> {
    match provider.rating {
        Some(rating) if !(1..=5).contains(&rating) => {
            Some(format!("rating {} outside 1..=5", rating))
        }
        _ => None,
    }
}

fn medication_issue(medication: &Medication) -> Option<String> {
    let (_, invalid) = medication.schedule.valid_times();
    if invalid > 0 {
        Some(format!("{} schedule time(s) not in HH:MM form", invalid))
    } else {
        None
    }
}

fn exercise_issue(exercise: &Exercise) -> Option<String> {
    if exercise.totals_consistent() {
        None
    } else {
        Some(format!(
            "totals ({} sessions, {}s) disagree with {} logged session(s)",
            exercise.total_sessions,
            exercise.total_duration,
            exercise.completed_sessions.len()
        ))
    }
}

fn value_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

/// Parse a top-level collection, dropping records that fail to parse or
/// that `check` rejects.
fn parse_records<T, F>(
    values: Vec<Value>,
    kind: RecordKind,
    check: F,
    report: &mut LoadReport,
) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Option<String>,
{
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let id = value_id(&value).map(str::to_string);
        match serde_json::from_value::<T>(value) {
            Ok(record) => match check(&record) {
                Some(reason) => {
                    report
                        .skipped
                        .push(RecordIssue::new(kind, index, id.as_deref(), reason));
                }
                None => records.push(record),
            },
            Err(e) => {
                report
                    .skipped
                    .push(RecordIssue::new(kind, index, id.as_deref(), e.to_string()));
            }
        }
    }
    records
}

/// Detach and parse a nested child list so one bad child does not take its
/// parent down with it.
fn take_children<T: DeserializeOwned>(
    value: &mut Value,
    field: &str,
    kind: RecordKind,
    report: &mut LoadReport,
) -> Vec<T> {
    let parent_id = value_id(value).unwrap_or("?").to_string();
    let children = match value.as_object_mut().and_then(|obj| obj.remove(field)) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Vec::new(),
        Some(_) => {
            report.skipped.push(RecordIssue::new(
                kind,
                0,
                None,
                format!("{} of {} is not a list", field, parent_id),
            ));
            return Vec::new();
        }
    };

    let mut parsed = Vec::with_capacity(children.len());
    for (index, child) in children.into_iter().enumerate() {
        let id = value_id(&child).map(str::to_string);
        match serde_json::from_value::<T>(child) {
            Ok(record) => parsed.push(record),
            Err(e) => report.skipped.push(RecordIssue::new(
                kind,
                index,
                id.as_deref(),
                format!("in {}: {}", parent_id, e),
            )),
        }
    }
    parsed
}

fn insert_children<T: Serialize>(value: &mut Value, field: &str, children: &[T]) -> Result<()> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert(field.to_string(), serde_json::to_value(children)?);
    }
    Ok(())
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store document, skipping records that are malformed.
    pub fn from_json_str(content: &str) -> Result<(Self, LoadReport)> {
        let raw: RawStore = serde_json::from_str(content)?;
        let mut report = LoadReport::default();

        let pain_entries = parse_records(raw.pain_entries, RecordKind::Pain, pain_issue, &mut report);

        let mut exercises = Vec::with_capacity(raw.exercises.len());
        for (index, mut value) in raw.exercises.into_iter().enumerate() {
            let sessions: Vec<ExerciseSession> =
                take_children(&mut value, "completedSessions", RecordKind::Session, &mut report);
            insert_children(&mut value, "completedSessions", &sessions)?;
            let id = value_id(&value).map(str::to_string);
            match serde_json::from_value::<Exercise>(value) {
                Ok(mut exercise) => {
                    if let Some(reason) = exercise_issue(&exercise) {
                        exercise.recompute_totals();
                        report.repaired.push(RecordIssue::new(
                            RecordKind::Exercise,
                            index,
                            id.as_deref(),
                            reason,
                        ));
                    }
                    exercises.push(exercise);
                }
                Err(e) => report.skipped.push(RecordIssue::new(
                    RecordKind::Exercise,
                    index,
                    id.as_deref(),
                    e.to_string(),
                )),
            }
        }

        let mut medication_values = raw.medications;
        for value in medication_values.iter_mut() {
            let doses: Vec<Dose> =
                take_children(value, "dosageHistory", RecordKind::Dose, &mut report);
            insert_children(value, "dosageHistory", &doses)?;
        }
        let medications = parse_records(
            medication_values,
            RecordKind::Medication,
            medication_issue,
            &mut report,
        );

        let appointments = parse_records(
            raw.appointments,
            RecordKind::Appointment,
            |_: &Appointment| None,
            &mut report,
        );
        let providers = parse_records(raw.providers, RecordKind::Provider, provider_issue, &mut report);

        let store = Self {
            pain_entries,
            exercises,
            medications,
            appointments,
            providers,
        };
        report.loaded = store.record_count();

        for issue in &report.skipped {
            tracing::warn!(
                kind = %issue.kind,
                index = issue.index,
                id = issue.id.as_deref().unwrap_or("?"),
                reason = %issue.reason,
                "Skipped malformed record"
            );
        }
        for issue in &report.repaired {
            tracing::debug!(
                kind = %issue.kind,
                id = issue.id.as_deref().unwrap_or("?"),
                reason = %issue.reason,
                "Recomputed exercise totals"
            );
        }

        Ok((store, report))
    }

    /// Load a store document from disk.
    pub fn load_from(path: &Path) -> Result<(Self, LoadReport)> {
        let content = std::fs::read_to_string(path)?;
        let (store, report) = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            repaired = report.repaired.len(),
            "Loaded record store"
        );
        Ok((store, report))
    }

    /// Write the store as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Number of top-level records plus nested sessions and doses.
    pub fn record_count(&self) -> usize {
        self.pain_entries.len()
            + self.exercises.len()
            + self
                .exercises
                .iter()
                .map(|e| e.completed_sessions.len())
                .sum::<usize>()
            + self.medications.len()
            + self
                .medications
                .iter()
                .map(|m| m.dosage_history.len())
                .sum::<usize>()
            + self.appointments.len()
            + self.providers.len()
    }

    /// Report every invariant violation without changing anything.
    pub fn validate(&self) -> Vec<RecordIssue> {
        let mut issues = Vec::new();

        for (index, entry) in self.pain_entries.iter().enumerate() {
            if let Some(reason) = pain_issue(entry) {
                issues.push(RecordIssue::new(RecordKind::Pain, index, Some(&entry.id), reason));
            }
        }
        for (index, exercise) in self.exercises.iter().enumerate() {
            if let Some(reason) = exercise_issue(exercise) {
                issues.push(RecordIssue::new(
                    RecordKind::Exercise,
                    index,
                    Some(&exercise.id),
                    reason,
                ));
            }
            for (session_index, session) in exercise.completed_sessions.iter().enumerate() {
                if session.exercise_id != exercise.id {
                    issues.push(RecordIssue::new(
                        RecordKind::Session,
                        session_index,
                        Some(&session.id),
                        format!(
                            "belongs to {} but is logged under {}",
                            session.exercise_id, exercise.id
                        ),
                    ));
                }
            }
        }
        for (index, medication) in self.medications.iter().enumerate() {
            if let Some(reason) = medication_issue(medication) {
                issues.push(RecordIssue::new(
                    RecordKind::Medication,
                    index,
                    Some(&medication.id),
                    reason,
                ));
            }
        }
        for (index, provider) in self.providers.iter().enumerate() {
            if let Some(reason) = provider_issue(provider) {
                issues.push(RecordIssue::new(
                    RecordKind::Provider,
                    index,
                    Some(&provider.id),
                    reason,
                ));
            }
        }

        issues
    }

    // ============================================
    // Write path
    // ============================================

    /// Replace the pain entry with the same id, or append a new one.
    pub fn upsert_pain_entry(&mut self, entry: PainEntry) -> Result<()> {
        if let Some(reason) = pain_issue(&entry) {
            return Err(Error::InvalidRecord {
                kind: RecordKind::Pain,
                id: entry.id,
                reason,
            });
        }
        match self.pain_entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.pain_entries.push(entry),
        }
        Ok(())
    }

    /// Delete a pain entry by id. Returns whether anything was removed.
    pub fn delete_pain_entry(&mut self, id: &str) -> bool {
        let before = self.pain_entries.len();
        self.pain_entries.retain(|e| e.id != id);
        self.pain_entries.len() != before
    }

    /// Append a completed session to its exercise and refresh the totals.
    pub fn record_session(&mut self, exercise_id: &str, session: ExerciseSession) -> Result<()> {
        let exercise = self
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or_else(|| Error::NotFound {
                kind: RecordKind::Exercise,
                id: exercise_id.to_string(),
            })?;

        exercise.total_sessions = exercise.total_sessions.saturating_add(1);
        exercise.total_duration = exercise.total_duration.saturating_add(session.duration);
        exercise.last_completed = Some(
            exercise
                .last_completed
                .map_or(session.completed_at, |last| last.max(session.completed_at)),
        );
        exercise.completed_sessions.push(session);
        Ok(())
    }

    /// Append a dose to a medication's history.
    pub fn record_dose(&mut self, medication_id: &str, dose: Dose) -> Result<()> {
        let medication = self
            .medications
            .iter_mut()
            .find(|m| m.id == medication_id)
            .ok_or_else(|| Error::NotFound {
                kind: RecordKind::Medication,
                id: medication_id.to_string(),
            })?;
        medication.dosage_history.push(dose);
        Ok(())
    }

    /// Replace the appointment with the same id, or append a new one.
    pub fn upsert_appointment(&mut self, appointment: Appointment) {
        match self
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
        {
            Some(existing) => *existing = appointment,
            None => self.appointments.push(appointment),
        }
    }

    /// Delete an appointment by id. Returns whether anything was removed.
    pub fn delete_appointment(&mut self, id: &str) -> bool {
        let before = self.appointments.len();
        self.appointments.retain(|a| a.id != id);
        self.appointments.len() != before
    }

    /// Look up a provider by id.
    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }
}
