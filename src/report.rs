use std::fmt::Write;

use crate::models::{SessionLogEntry, SubjectAttendanceRecord};
use crate::stats::{self, round_for_display};

pub fn build_report(
    student: Option<&str>,
    records: &[SubjectAttendanceRecord],
    sessions: &[SessionLogEntry],
    minimum_threshold: f64,
    recent_limit: usize,
) -> String {
    let summary = stats::summarize(records, minimum_threshold);
    let recent = stats::recent_sessions(sessions, recent_limit);

    let mut output = String::new();
    let student_label = student.unwrap_or("student");

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(output, "Generated for {}", student_label);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");
    let _ = writeln!(
        output,
        "- Attendance: {:.2}% ({} of {} classes attended)",
        round_for_display(summary.overall_percentage, 2),
        summary.total_present,
        summary.total_sessions
    );
    let _ = writeln!(output, "- Status: {}", summary.overall_status.label());
    let _ = writeln!(
        output,
        "- Risk: {} (minimum {:.0}%)",
        summary.risk_status.label(),
        summary.minimum_threshold
    );
    match summary.sessions_to_recover {
        Some(0) => {}
        Some(needed) => {
            let _ = writeln!(
                output,
                "- Attend the next {} classes to reach the minimum",
                needed
            );
        }
        None => {
            let _ = writeln!(output, "- The minimum can no longer be reached");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject-wise Attendance");

    if summary.subjects.is_empty() {
        let _ = writeln!(output, "No subject records available.");
    } else {
        let _ = writeln!(output, "| Subject | Attended | Percentage | Status |");
        let _ = writeln!(output, "|---|---|---|---|");
        for subject in summary.subjects.iter() {
            let _ = writeln!(
                output,
                "| {}{} | {} of {} | {:.1}% | {} |",
                subject.subject_name,
                if subject.below_threshold { " (!)" } else { "" },
                subject.present,
                subject.total,
                round_for_display(subject.percentage, 1),
                subject.status.label()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Sessions");

    if recent.is_empty() {
        let _ = writeln!(output, "No sessions recorded.");
    } else {
        for entry in recent.iter() {
            let _ = writeln!(
                output,
                "- {} {}: {}",
                entry.date.format("%a, %b %-d"),
                entry.subject_name,
                entry.status.label()
            );
        }
    }

    output
}
