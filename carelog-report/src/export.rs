//! Flat CSV export of raw records.

use anyhow::Result;
use carelog_core::analytics::{filter_window, is_on_time, TimeWindow};
use carelog_core::{RecordKind, RecordStore};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::io::Write;

/// Quote a field when it holds a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row<W: Write>(out: &mut W, fields: &[String]) -> Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    writeln!(out, "{}", line.join(","))?;
    Ok(())
}

fn header<W: Write>(out: &mut W, names: &[&str]) -> Result<()> {
    writeln!(out, "{}", names.join(","))?;
    Ok(())
}

fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Write every record of `kind` inside `window` as CSV.
///
/// Appointments ignore the window end so upcoming visits are included.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(
    out: &mut W,
    store: &RecordStore,
    kind: RecordKind,
    window: &TimeWindow,
    tolerance: Duration,
) -> Result<usize> {
    let mut rows = 0;
    match kind {
        RecordKind::Pain => {
            header(
                out,
                &[
                    "id", "timestamp", "level", "location", "type", "triggers", "symptoms",
                    "timeOfDay", "notes",
                ],
            )?;
            for entry in filter_window(&store.pain_entries, |e| e.timestamp, window) {
                write_row(
                    out,
                    &[
                        entry.id.clone(),
                        ts(entry.timestamp),
                        entry.level.to_string(),
                        opt(&entry.location),
                        opt(&entry.pain_type),
                        entry.triggers.join("; "),
                        entry.symptoms.join("; "),
                        entry.time_of_day.label().to_lowercase(),
                        opt(&entry.notes),
                    ],
                )?;
                rows += 1;
            }
        }
        RecordKind::Exercise | RecordKind::Session => {
            header(
                out,
                &[
                    "id", "exerciseId", "exercise", "category", "minutes", "calories",
                    "completedAt",
                ],
            )?;
            let sessions = store.exercises.iter().flat_map(|e| e.completed_sessions.iter());
            for session in filter_window(sessions, |s| s.completed_at, window) {
                write_row(
                    out,
                    &[
                        session.id.clone(),
                        session.exercise_id.clone(),
                        session.exercise_name.clone(),
                        session.category.clone(),
                        format!("{:.1}", session.duration as f64 / 60.0),
                        session.calories_burned.to_string(),
                        ts(session.completed_at),
                    ],
                )?;
                rows += 1;
            }
        }
        RecordKind::Medication | RecordKind::Dose => {
            header(
                out,
                &[
                    "id", "medication", "dosage", "timestamp", "scheduledTime", "onTime",
                    "sideEffects",
                ],
            )?;
            for medication in &store.medications {
                for dose in filter_window(&medication.dosage_history, |d| d.timestamp, window) {
                    write_row(
                        out,
                        &[
                            dose.id.clone(),
                            medication.name.clone(),
                            dose.dosage.clone(),
                            ts(dose.timestamp),
                            ts(dose.scheduled_time),
                            is_on_time(dose, tolerance).to_string(),
                            dose.side_effects.join("; "),
                        ],
                    )?;
                    rows += 1;
                }
            }
        }
        RecordKind::Appointment | RecordKind::Provider => {
            header(
                out,
                &["id", "type", "provider", "dateTime", "minutes", "status", "location"],
            )?;
            let window = window.open_ended();
            for appointment in filter_window(&store.appointments, |a| a.date_time, &window) {
                let provider = store
                    .provider(&appointment.provider_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| appointment.provider_id.clone());
                write_row(
                    out,
                    &[
                        appointment.id.clone(),
                        appointment.appointment_type.clone(),
                        provider,
                        ts(appointment.date_time),
                        appointment.duration.to_string(),
                        appointment.status.as_str().to_string(),
                        opt(&appointment.location),
                    ],
                )?;
                rows += 1;
            }
        }
    }
    Ok(rows)
}
