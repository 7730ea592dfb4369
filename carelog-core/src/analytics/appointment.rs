//! Appointment statistics.
//!
//! Whether an appointment is upcoming or completed is decided against `now`
//! at report time; the stored status only matters for cancellations.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::tally;
use crate::types::{Appointment, AppointmentStatus, Provider};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCount {
    pub provider: String,
    pub count: usize,
}

/// The soonest upcoming appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAppointment {
    pub id: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub provider: String,
    pub date_time: DateTime<Utc>,
}

/// Appointment statistics for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub total_appointments: usize,
    pub upcoming_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub top_types: Vec<TypeCount>,
    pub top_providers: Vec<ProviderCount>,
    pub appointments_this_month: usize,
    pub next_appointment: Option<NextAppointment>,
}

fn provider_name<'a>(providers: &'a [Provider], id: &'a str) -> &'a str {
    providers
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.as_str())
        .unwrap_or(id)
}

/// Summarize appointments already filtered to a window.
///
/// Provider ids are resolved to names through `providers`; an unknown id is
/// reported as-is. Returns `None` when there are no appointments.
pub fn summarize_appointments(
    filtered: &[&Appointment],
    providers: &[Provider],
    now: DateTime<Utc>,
    top_n: usize,
) -> Option<AppointmentSummary> {
    if filtered.is_empty() {
        return None;
    }

    let (cancelled, active): (Vec<&Appointment>, Vec<&Appointment>) = filtered
        .iter()
        .copied()
        .partition(|a| a.status == AppointmentStatus::Cancelled);

    let upcoming_appointments = active.iter().filter(|a| a.is_upcoming(now)).count();
    let completed_appointments = active.len() - upcoming_appointments;

    let top_types = tally(filtered.iter().map(|a| a.appointment_type.as_str()))
        .into_iter()
        .take(top_n)
        .map(|(appointment_type, count)| TypeCount {
            appointment_type: appointment_type.to_string(),
            count,
        })
        .collect();

    let top_providers = tally(
        filtered
            .iter()
            .map(|a| provider_name(providers, &a.provider_id)),
    )
    .into_iter()
    .take(top_n)
    .map(|(provider, count)| ProviderCount {
        provider: provider.to_string(),
        count,
    })
    .collect();

    let appointments_this_month = filtered
        .iter()
        .filter(|a| a.date_time.year() == now.year() && a.date_time.month() == now.month())
        .count();

    let next_appointment = active
        .iter()
        .filter(|a| a.is_upcoming(now))
        .min_by_key(|a| a.date_time)
        .map(|a| NextAppointment {
            id: a.id.clone(),
            appointment_type: a.appointment_type.clone(),
            provider: provider_name(providers, &a.provider_id).to_string(),
            date_time: a.date_time,
        });

    Some(AppointmentSummary {
        total_appointments: filtered.len(),
        upcoming_appointments,
        completed_appointments,
        cancelled_appointments: cancelled.len(),
        top_types,
        top_providers,
        appointments_this_month,
        next_appointment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap()
    }

    fn appointment(id: &str, kind: &str, provider: &str, offset_days: i64) -> Appointment {
        Appointment {
            id: id.to_string(),
            provider_id: provider.to_string(),
            appointment_type: kind.to_string(),
            date_time: now() + Duration::days(offset_days),
            duration: 30,
            location: None,
            notes: None,
            preparation: vec![],
            status: AppointmentStatus::Scheduled,
        }
    }

    fn providers() -> Vec<Provider> {
        vec![Provider {
            id: "dr-lee".to_string(),
            name: "Dr. Lee".to_string(),
            specialty: "Physiotherapy".to_string(),
            practice: None,
            phone: None,
            email: None,
            address: None,
            accepted_insurance: vec![],
            rating: Some(5),
        }]
    }

    #[test]
    fn test_empty_is_none() {
        assert!(summarize_appointments(&[], &providers(), now(), 5).is_none());
    }

    #[test]
    fn test_upcoming_and_completed_are_derived_from_now() {
        let mut cancelled = appointment("a4", "Follow-up", "dr-lee", 3);
        cancelled.status = AppointmentStatus::Cancelled;
        let items = vec![
            appointment("a1", "Physio", "dr-lee", -25),
            appointment("a2", "Physio", "dr-lee", -2),
            appointment("a3", "Check-up", "dr-kim", 5),
            cancelled,
            appointment("a5", "Physio", "dr-lee", 0),
        ];
        let refs: Vec<&Appointment> = items.iter().collect();
        let summary = summarize_appointments(&refs, &providers(), now(), 5).unwrap();

        assert_eq!(summary.total_appointments, 5);
        assert_eq!(summary.upcoming_appointments, 1);
        // Exactly at `now` counts as completed
        assert_eq!(summary.completed_appointments, 3);
        assert_eq!(summary.cancelled_appointments, 1);
        // May 26, June 18, June 25, June 23, June 20
        assert_eq!(summary.appointments_this_month, 4);

        assert_eq!(summary.top_types[0].appointment_type, "Physio");
        assert_eq!(summary.top_types[0].count, 3);
        assert_eq!(summary.top_types[1].appointment_type, "Check-up");

        assert_eq!(summary.top_providers[0].provider, "Dr. Lee");
        assert_eq!(summary.top_providers[0].count, 4);
        assert_eq!(summary.top_providers[1].provider, "dr-kim");

        let next = summary.next_appointment.unwrap();
        assert_eq!(next.id, "a3");
        assert_eq!(next.provider, "dr-kim");
    }
}
