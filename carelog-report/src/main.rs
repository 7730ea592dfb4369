//! carelog-report - Health report CLI
//!
//! Summarize pain, exercise, medication and appointment records for a
//! time range.

mod export;

use anyhow::{Context, Result};
use carelog_core::analytics::{
    generate_report, todays_doses, DoseStatus, HealthReport, ReportSettings, TimeRange,
};
use carelog_core::{Config, RecordKind, RecordStore};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carelog-report")]
#[command(about = "Carelog - Your health report")]
#[command(version)]
struct Args {
    /// Record store to read (default: $XDG_DATA_HOME/carelog/records.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Time range: 7days, 30days, 3months, 6months, 1year
    #[arg(long)]
    range: Option<String>,

    /// Report time in RFC 3339 (default: now)
    #[arg(long)]
    now: Option<String>,

    /// Export format (md = markdown, json = JSON, csv = raw records)
    #[arg(long)]
    export: Option<String>,

    /// Record kind for CSV export: pain, exercise, medication, appointment
    #[arg(long)]
    kind: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration and records
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = carelog_core::logging::init(&config.logging).ok();

    let store_path = args.store.clone().unwrap_or_else(|| config.store_path());
    let (store, load_report) = RecordStore::load_from(&store_path)
        .with_context(|| format!("failed to load records from {}", store_path.display()))?;
    if !load_report.skipped.is_empty() {
        eprintln!(
            "warning: skipped {} malformed record(s) in {}",
            load_report.skipped.len(),
            store_path.display()
        );
    }

    let range = match &args.range {
        Some(value) => value
            .parse::<TimeRange>()
            .map_err(anyhow::Error::msg)
            .context("Invalid range. Use 7days, 30days, 3months, 6months or 1year")?,
        None => config.default_range(),
    };

    let now = match &args.now {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .context("Invalid --now. Use RFC 3339 (e.g., 2024-06-30T12:00:00Z)")?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let settings = config.report_settings();
    tracing::info!(range = %range, now = %now, "Generating health report");

    match args.export.as_deref() {
        Some("csv") => {
            let kind = parse_kind(args.kind.as_deref())?;
            let window = range.resolve(now);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            export::write_csv(&mut out, &store, kind, &window, settings.on_time_tolerance)?;
        }
        Some(format) => {
            let report = generate_report(&store, range, now, &settings);
            match format {
                "json" => print_json(&report)?,
                "md" => print_markdown(&report),
                other => {
                    anyhow::bail!("Unknown export format: {}. Use 'md', 'json' or 'csv'", other)
                }
            }
        }
        None => {
            let report = generate_report(&store, range, now, &settings);
            print_terminal(&report, &store, &settings);
        }
    }

    Ok(())
}

fn parse_kind(kind: Option<&str>) -> Result<RecordKind> {
    match kind {
        Some("pain") => Ok(RecordKind::Pain),
        Some("exercise") => Ok(RecordKind::Exercise),
        Some("medication") => Ok(RecordKind::Medication),
        Some("appointment") => Ok(RecordKind::Appointment),
        Some(other) => anyhow::bail!(
            "Unknown record kind: {}. Use pain, exercise, medication or appointment",
            other
        ),
        None => anyhow::bail!("--export csv needs --kind (pain, exercise, medication, appointment)"),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn dose_status_label(status: DoseStatus) -> &'static str {
    match status {
        DoseStatus::Taken => "taken",
        DoseStatus::Due => "due now",
        DoseStatus::Overdue => "overdue",
        DoseStatus::Upcoming => "upcoming",
    }
}

fn print_terminal(report: &HealthReport, store: &RecordStore, settings: &ReportSettings) {
    let title = format!("HEALTH REPORT: {}", report.range.display_name());

    // Header
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();

    if report.is_empty() {
        println!("  No records found for this period.");
        println!();
        return;
    }

    if let Some(pain) = &report.pain {
        println!("PAIN");
        println!(
            "   Entries: {:<12} Average: {:.1}  (all time {:.1})",
            pain.total_entries, pain.avg_pain_level, pain.all_time_avg_pain_level
        );
        println!(
            "   Range:   {}-{:<10} Trend:   {} ({:+.1})",
            pain.min_pain_level,
            pain.max_pain_level,
            pain.trend.as_str(),
            pain.trend_value
        );
        println!("   This week: {} entries", pain.entries_this_week);
        if let Some(outlook) = report.insights.pain_outlook {
            println!("   Outlook: {}", outlook.label());
        }
        for (i, trigger) in pain.top_triggers.iter().enumerate() {
            println!("   {}. {:<20} {:>4}", i + 1, trigger.trigger, trigger.count);
        }
        if let Some(worst) = pain.time_of_day_analysis.first() {
            println!(
                "   Worst time of day: {} (avg {:.1})",
                worst.time.label(),
                worst.avg_pain
            );
        }
        println!();
    }

    if let Some(exercise) = &report.exercise {
        println!("EXERCISE");
        println!(
            "   Sessions: {:<11} Minutes: {:<8} Calories: {}",
            exercise.total_sessions, exercise.total_minutes, exercise.total_calories
        );
        println!(
            "   Per week: {:<11} Avg length: {} min",
            exercise.avg_sessions_per_week, exercise.avg_session_length
        );
        if let Some(rating) = report.insights.activity_rating {
            println!("   Activity: {}", rating.label());
        }
        for (i, category) in exercise.top_categories.iter().enumerate() {
            println!(
                "   {}. {:<20} {:>3} session{}, {} min",
                i + 1,
                category.category,
                category.sessions,
                plural(category.sessions),
                category.minutes
            );
        }
        println!();
    }

    if let Some(medication) = &report.medication {
        println!("MEDICATION");
        println!(
            "   Doses: {} of {} expected ({}% adherence)",
            medication.total_doses, medication.expected_doses, medication.adherence_rate
        );
        if let Some(rating) = report.insights.adherence_rating {
            println!("   Adherence rating: {}", rating.label());
        }
        for stat in &medication.medication_stats {
            println!(
                "   {:<24} {:>3} dose{}, {}% on time",
                stat.name,
                stat.doses,
                plural(stat.doses),
                stat.on_time_rate
            );
        }
        if !medication.top_side_effects.is_empty() {
            let effects: Vec<String> = medication
                .top_side_effects
                .iter()
                .map(|s| format!("{} ({})", s.effect, s.count))
                .collect();
            println!("   Side effects: {}", effects.join(", "));
        }
        println!();
    }

    // Today's schedule
    let today: Vec<(String, String)> = store
        .medications
        .iter()
        .flat_map(|m| {
            todays_doses(m, report.generated_at, settings.on_time_tolerance)
                .into_iter()
                .map(move |slot| {
                    (
                        format!("{} {}", slot.time.format("%H:%M"), m.name),
                        dose_status_label(slot.status).to_string(),
                    )
                })
        })
        .collect();
    if !today.is_empty() {
        println!("TODAY'S DOSES");
        for (slot, status) in &today {
            println!("   {:<30} {}", slot, status);
        }
        println!();
    }

    if let Some(appointments) = &report.appointments {
        println!("APPOINTMENTS");
        println!(
            "   Total: {:<6} Upcoming: {:<6} Completed: {:<6} Cancelled: {}",
            appointments.total_appointments,
            appointments.upcoming_appointments,
            appointments.completed_appointments,
            appointments.cancelled_appointments
        );
        if let Some(next) = &appointments.next_appointment {
            println!(
                "   Next: {} with {} on {}",
                next.appointment_type,
                next.provider,
                next.date_time.format("%b %d %H:%M")
            );
        }
        println!();
    }

    println!("RECOMMENDATIONS");
    for recommendation in &report.recommendations {
        println!("   - {}", recommendation.message);
    }
    println!();
}

fn print_markdown(report: &HealthReport) {
    println!("# Health Report: {}", report.range.display_name());
    println!();
    println!(
        "*{} to {}*",
        report.window.start.format("%Y-%m-%d"),
        report.window.end.format("%Y-%m-%d")
    );
    println!();

    if report.is_empty() {
        println!("*No records found for this period.*");
        println!();
    }

    if let Some(pain) = &report.pain {
        println!("## Pain");
        println!();
        println!("| Metric | Value |");
        println!("|--------|-------|");
        println!("| Entries | {} |", pain.total_entries);
        println!("| Average level | {:.1} |", pain.avg_pain_level);
        println!("| All-time average | {:.1} |", pain.all_time_avg_pain_level);
        println!("| Highest | {} |", pain.max_pain_level);
        println!("| Lowest | {} |", pain.min_pain_level);
        println!("| Trend | {} ({:+.1}) |", pain.trend.as_str(), pain.trend_value);
        println!("| This week | {} |", pain.entries_this_week);
        if let Some(outlook) = report.insights.pain_outlook {
            println!("| Outlook | {} |", outlook.label());
        }
        println!();
        if !pain.top_triggers.is_empty() {
            println!("**Top triggers:**");
            println!();
            for (i, trigger) in pain.top_triggers.iter().enumerate() {
                println!("{}. {} ({})", i + 1, trigger.trigger, trigger.count);
            }
            println!();
        }
        if !pain.time_of_day_analysis.is_empty() {
            println!("**By time of day:**");
            println!();
            for bucket in &pain.time_of_day_analysis {
                println!(
                    "- {}: {:.1} ({} entr{})",
                    bucket.time.label(),
                    bucket.avg_pain,
                    bucket.entries,
                    if bucket.entries == 1 { "y" } else { "ies" }
                );
            }
            println!();
        }
    }

    if let Some(exercise) = &report.exercise {
        println!("## Exercise");
        println!();
        println!("| Metric | Value |");
        println!("|--------|-------|");
        println!("| Sessions | {} |", exercise.total_sessions);
        println!("| Minutes | {} |", exercise.total_minutes);
        println!("| Calories | {} |", exercise.total_calories);
        println!("| Sessions per week | {} |", exercise.avg_sessions_per_week);
        println!("| Average length | {} min |", exercise.avg_session_length);
        println!("| This week | {} |", exercise.sessions_this_week);
        if let Some(rating) = report.insights.activity_rating {
            println!("| Activity | {} |", rating.label());
        }
        println!();
        for (i, item) in exercise.top_exercises.iter().enumerate() {
            println!(
                "{}. **{}** - {} session{}",
                i + 1,
                item.exercise,
                item.count,
                plural(item.count)
            );
        }
        println!();
    }

    if let Some(medication) = &report.medication {
        println!("## Medication");
        println!();
        println!(
            "- **Adherence:** {}% ({} of {} expected doses)",
            medication.adherence_rate, medication.total_doses, medication.expected_doses
        );
        if let Some(rating) = report.insights.adherence_rating {
            println!("- **Adherence rating:** {}", rating.label());
        }
        println!("- **Doses per day:** {:.1}", medication.avg_doses_per_day);
        println!("- **Active medications:** {}", medication.active_medications);
        println!();
        println!("| Medication | Doses | On time |");
        println!("|------------|-------|---------|");
        for stat in &medication.medication_stats {
            println!("| {} | {} | {}% |", stat.name, stat.doses, stat.on_time_rate);
        }
        println!();
    }

    if let Some(appointments) = &report.appointments {
        println!("## Appointments");
        println!();
        println!("- **Total:** {}", appointments.total_appointments);
        println!("- **Upcoming:** {}", appointments.upcoming_appointments);
        println!("- **Completed:** {}", appointments.completed_appointments);
        println!("- **Cancelled:** {}", appointments.cancelled_appointments);
        println!("- **This month:** {}", appointments.appointments_this_month);
        if let Some(next) = &appointments.next_appointment {
            println!(
                "- **Next:** {} with {} on {}",
                next.appointment_type,
                next.provider,
                next.date_time.format("%Y-%m-%d %H:%M")
            );
        }
        println!();
    }

    if let Some(correlation) = &report.insights.pain_exercise {
        println!("## Pain and Exercise");
        println!();
        println!(
            "Average pain is {:.1} on exercise days ({}) and {:.1} on rest days ({}).",
            correlation.avg_pain_exercise_days,
            correlation.exercise_days,
            correlation.avg_pain_rest_days,
            correlation.rest_days
        );
        println!();
    }

    println!("## Recommendations");
    println!();
    for recommendation in &report.recommendations {
        println!("- {}", recommendation.message);
    }
    println!();

    println!("---");
    println!(
        "*Generated on {} by carelog-report*",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
}

fn print_json(report: &HealthReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
