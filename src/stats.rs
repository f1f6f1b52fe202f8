use crate::models::{
    AttendanceStatus, AttendanceSummary, RiskStatus, SessionLogEntry, SubjectAttendanceRecord,
    SubjectSummary,
};

/// Minimum overall attendance, in percent, for a student to be considered safe.
pub const MINIMUM_ATTENDANCE_THRESHOLD: f64 = 75.0;

/// Largest recovery estimate reported; anything beyond is unreachable in practice.
pub const MAX_RECOVERY_SESSIONS: u64 = u32::MAX as u64;

pub fn compute_subject_percentage(present: u32, total: u32) -> f64 {
    percentage_of(present.into(), total.into())
}

fn percentage_of(present: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    present as f64 / total as f64 * 100.0
}

pub fn classify(percentage: f64) -> AttendanceStatus {
    if percentage >= 90.0 {
        AttendanceStatus::Excellent
    } else if percentage >= 80.0 {
        AttendanceStatus::Good
    } else if percentage >= 75.0 {
        AttendanceStatus::Satisfactory
    } else {
        AttendanceStatus::NeedsImprovement
    }
}

/// Overall attendance weighted by the number of sessions held per subject,
/// i.e. all attended sessions over all held sessions.
pub fn compute_overall(records: &[SubjectAttendanceRecord]) -> f64 {
    let (present, total) = totals(records);
    percentage_of(present, total)
}

pub fn risk_status(overall_percentage: f64, minimum_threshold: f64) -> RiskStatus {
    if overall_percentage >= minimum_threshold {
        RiskStatus::Safe
    } else {
        RiskStatus::AtRisk
    }
}

pub fn round_for_display(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Consecutive attended sessions needed before `present / total` reaches
/// `threshold`. `None` when no number of sessions can get there, or when
/// it would take more than [`MAX_RECOVERY_SESSIONS`].
pub fn sessions_needed_to_recover(present: u64, total: u64, threshold: f64) -> Option<u64> {
    if threshold.is_nan() {
        return None;
    }
    let meets = |extra: u64| -> Option<bool> {
        let present = present.checked_add(extra)?;
        let total = total.checked_add(extra)?;
        Some(total == 0 || percentage_of(present, total) >= threshold)
    };
    if meets(0)? {
        return Some(0);
    }
    if threshold >= 100.0 {
        return None;
    }

    // (p + k) / (t + k) >= T/100  <=>  k >= (T*t - 100*p) / (100 - T)
    let estimate = (threshold * total as f64 - 100.0 * present as f64) / (100.0 - threshold);
    if !estimate.is_finite() || estimate > MAX_RECOVERY_SESSIONS as f64 {
        return None;
    }
    let mut needed = estimate.ceil().max(0.0) as u64;
    while needed > 0 && meets(needed - 1)? {
        needed -= 1;
    }
    while !meets(needed)? {
        needed += 1;
        if needed > MAX_RECOVERY_SESSIONS {
            return None;
        }
    }
    Some(needed)
}

pub fn summarize(records: &[SubjectAttendanceRecord], minimum_threshold: f64) -> AttendanceSummary {
    let subjects = records
        .iter()
        .map(|record| {
            let percentage = record.percentage();
            SubjectSummary {
                subject_name: record.subject_name.clone(),
                present: record.present,
                total: record.total,
                percentage,
                status: classify(percentage),
                below_threshold: percentage < minimum_threshold,
            }
        })
        .collect();

    let (total_present, total_sessions) = totals(records);
    let overall_percentage = compute_overall(records);

    AttendanceSummary {
        subjects,
        total_present,
        total_sessions,
        overall_percentage,
        overall_status: classify(overall_percentage),
        minimum_threshold,
        risk_status: risk_status(overall_percentage, minimum_threshold),
        sessions_to_recover: sessions_needed_to_recover(
            total_present,
            total_sessions,
            minimum_threshold,
        ),
    }
}

/// Most recent log entries first; entries on the same date keep their
/// recorded order.
pub fn recent_sessions(entries: &[SessionLogEntry], limit: usize) -> Vec<SessionLogEntry> {
    let mut recent = entries.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(limit);
    recent
}

fn totals(records: &[SubjectAttendanceRecord]) -> (u64, u64) {
    records.iter().fold((0, 0), |(present, total), record| {
        (present + u64::from(record.present), total + u64::from(record.total))
    })
}
