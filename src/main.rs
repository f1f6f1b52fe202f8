use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod records;
mod report;
mod roster;
mod stats;

use config::Config;
use models::{AttendanceSummary, ClassSessionDescriptor, SessionLogEntry};
use roster::{AttendanceSheet, RosterSizePolicy};
use stats::round_for_display;

#[derive(Parser)]
#[command(name = "attendance-core")]
#[command(about = "Class attendance rosters and attendance statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a roster for a class session, mark absentees and submit
    Roster {
        /// Department name or code (CS, IT, EE)
        #[arg(long)]
        department: Option<String>,
        /// Batch such as 2022-2026
        #[arg(long)]
        batch: Option<String>,
        /// Session date, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// FN (forenoon) or AN (afternoon)
        #[arg(long, default_value = "FN")]
        slot: String,
        /// Fixed roster size instead of a random one
        #[arg(long)]
        size: Option<usize>,
        /// Sequence numbers of absent students
        #[arg(long, value_delimiter = ',')]
        absent: Vec<u32>,
        /// Sequence numbers whose presence is flipped after absentees are marked
        #[arg(long, value_delimiter = ',')]
        toggle: Vec<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Show attendance statistics for a student
    Dashboard {
        #[arg(long)]
        subjects: Option<PathBuf>,
        #[arg(long)]
        sessions: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f64>,
        /// Only subjects from this semester ("Current", "Fall 2024", ...)
        #[arg(long)]
        semester: Option<String>,
        #[arg(long)]
        recent: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown attendance report
    Report {
        #[arg(long)]
        subjects: Option<PathBuf>,
        #[arg(long)]
        sessions: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        semester: Option<String>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the sample subject and session records as CSV
    Seed {
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
}

#[derive(Serialize)]
struct DashboardOutput<'a> {
    summary: &'a AttendanceSummary,
    recent_sessions: &'a [SessionLogEntry],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Roster {
            department,
            batch,
            date,
            slot,
            size,
            absent,
            toggle,
            json,
        } => {
            let descriptor = ClassSessionDescriptor::from_form(
                department.as_deref(),
                batch.as_deref(),
                date.as_deref(),
                Some(slot.as_str()),
            )?;
            let policy = match size {
                Some(size) => RosterSizePolicy::Fixed(size),
                None => config.roster_policy(),
            };

            let mut sheet = AttendanceSheet::new();
            sheet
                .generate(descriptor, &policy)
                .context("failed to generate roster")?;
            for sequence_number in absent {
                sheet.mark_absent(sequence_number)?;
            }
            for sequence_number in toggle {
                sheet.toggle(sequence_number)?;
            }
            let result = sheet.submit()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&sheet)?);
                return Ok(());
            }

            if let Some(descriptor) = sheet.descriptor() {
                println!(
                    "{} - {} ({} Session) on {}",
                    descriptor.department.map(|d| d.name()).unwrap_or_default(),
                    descriptor.batch,
                    descriptor.slot,
                    descriptor.date.map(|d| d.to_string()).unwrap_or_default()
                );
            }
            if let Some(session_id) = sheet.session_id() {
                println!("Session {session_id}");
            }
            for entry in sheet.roster() {
                println!(
                    "{:<10} {:<12} {}",
                    entry.roll_number,
                    entry.display_name,
                    if entry.is_present { "Present" } else { "Absent" }
                );
            }
            println!();
            println!("Attendance Summary");
            println!("Total Students: {}", result.total_students);
            println!("Present: {}", result.present_count);
            println!("Absent: {}", result.absent_count);
        }
        Commands::Dashboard {
            subjects,
            sessions,
            threshold,
            semester,
            recent,
            json,
        } => {
            let config = config.with_threshold(threshold)?;
            let subject_records = records::for_semester(
                records::subjects_or_sample(subjects.as_deref())?,
                semester.as_deref(),
            );
            let log = records::sessions_or_sample(sessions.as_deref())?;
            let summary = stats::summarize(&subject_records, config.minimum_threshold);
            let recent_sessions =
                stats::recent_sessions(&log, recent.unwrap_or(config.recent_limit));

            if json {
                let output = DashboardOutput {
                    summary: &summary,
                    recent_sessions: &recent_sessions,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            println!(
                "Overall attendance {:.2}% ({}) - {} (minimum {:.0}%)",
                round_for_display(summary.overall_percentage, 2),
                summary.overall_status.label(),
                summary.risk_status.label(),
                summary.minimum_threshold
            );
            if let Some(needed) = summary.sessions_to_recover.filter(|n| *n > 0) {
                println!("Attend the next {needed} classes to reach the minimum.");
            }
            println!();
            println!("Subject-wise attendance:");
            for subject in summary.subjects.iter() {
                println!(
                    "- {}: {:.1}% ({} of {} classes attended) {}",
                    subject.subject_name,
                    round_for_display(subject.percentage, 1),
                    subject.present,
                    subject.total,
                    subject.status.label()
                );
            }
            println!();
            println!("Recent sessions:");
            for entry in recent_sessions.iter() {
                println!(
                    "- {} {}: {}",
                    entry.date.format("%a, %b %-d"),
                    entry.subject_name,
                    entry.status.label()
                );
            }
        }
        Commands::Report {
            subjects,
            sessions,
            threshold,
            semester,
            student,
            out,
        } => {
            let config = config.with_threshold(threshold)?;
            let subject_records = records::for_semester(
                records::subjects_or_sample(subjects.as_deref())?,
                semester.as_deref(),
            );
            let log = records::sessions_or_sample(sessions.as_deref())?;
            let report = report::build_report(
                student.as_deref(),
                &subject_records,
                &log,
                config.minimum_threshold,
                config.recent_limit,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Seed { dir } => {
            let (subjects_path, sessions_path) = records::write_seed(&dir)?;
            println!(
                "Sample data written to {} and {}.",
                subjects_path.display(),
                sessions_path.display()
            );
        }
    }

    Ok(())
}
