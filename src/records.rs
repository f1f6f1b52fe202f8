use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;

use crate::models::{PresenceMark, SessionLogEntry, SubjectAttendanceRecord, CURRENT_SEMESTER};

pub const SUBJECTS_FILE: &str = "subjects.csv";
pub const SESSIONS_FILE: &str = "sessions.csv";

#[derive(serde::Deserialize)]
struct SubjectRow {
    subject_name: String,
    present: u32,
    total: u32,
    #[serde(default)]
    semester: Option<String>,
}

pub fn load_subjects(csv_path: &Path) -> anyhow::Result<Vec<SubjectAttendanceRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<SubjectRow>().enumerate() {
        let row_number = index + 2;
        let row = result
            .with_context(|| format!("{}: malformed row {row_number}", csv_path.display()))?;
        let record = SubjectAttendanceRecord::new(&row.subject_name, row.present, row.total)
            .with_context(|| format!("{}: invalid row {row_number}", csv_path.display()))?
            .with_semester(row.semester.as_deref());
        records.push(record);
    }

    tracing::info!(path = %csv_path.display(), subjects = records.len(), "subject records loaded");
    Ok(records)
}

pub fn load_sessions(csv_path: &Path) -> anyhow::Result<Vec<SessionLogEntry>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut entries = Vec::new();

    for (index, result) in reader.deserialize::<SessionLogEntry>().enumerate() {
        let entry = result
            .with_context(|| format!("{}: malformed row {}", csv_path.display(), index + 2))?;
        entries.push(entry);
    }

    tracing::info!(path = %csv_path.display(), sessions = entries.len(), "session log loaded");
    Ok(entries)
}

pub fn sample_subjects() -> anyhow::Result<Vec<SubjectAttendanceRecord>> {
    let subjects = vec![
        ("Database Management", 15, 16),
        ("Human-Computer Interaction", 12, 15),
        ("Data Structures & Algorithms", 14, 18),
        ("Computer Networks", 16, 18),
        ("Software Engineering", 12, 14),
    ];

    subjects
        .into_iter()
        .map(|(name, present, total)| {
            SubjectAttendanceRecord::new(name, present, total)
                .map(|record| record.with_semester(Some(CURRENT_SEMESTER)))
                .map_err(anyhow::Error::from)
        })
        .collect()
}

pub fn sample_sessions() -> anyhow::Result<Vec<SessionLogEntry>> {
    let sessions = vec![
        ((2025, 5, 18), "Database Management", PresenceMark::Present),
        ((2025, 5, 18), "Software Engineering", PresenceMark::Absent),
        ((2025, 5, 17), "Computer Networks", PresenceMark::Present),
        ((2025, 5, 17), "Data Structures & Algorithms", PresenceMark::Present),
        ((2025, 5, 16), "Human-Computer Interaction", PresenceMark::Present),
        ((2025, 5, 16), "Database Management", PresenceMark::Present),
        ((2025, 5, 15), "Software Engineering", PresenceMark::Present),
        ((2025, 5, 15), "Computer Networks", PresenceMark::Absent),
    ];

    let mut entries = Vec::new();
    for ((year, month, day), subject_name, status) in sessions {
        entries.push(SessionLogEntry {
            date: NaiveDate::from_ymd_opt(year, month, day).context("invalid date")?,
            subject_name: subject_name.to_string(),
            status,
        });
    }
    Ok(entries)
}

/// Load subject records from `path`, or fall back to the sample dataset.
pub fn subjects_or_sample(path: Option<&Path>) -> anyhow::Result<Vec<SubjectAttendanceRecord>> {
    match path {
        Some(path) => load_subjects(path),
        None => sample_subjects(),
    }
}

/// Keep the records of one semester; `None` keeps everything.
pub fn for_semester(
    records: Vec<SubjectAttendanceRecord>,
    semester: Option<&str>,
) -> Vec<SubjectAttendanceRecord> {
    match semester {
        Some(semester) => records
            .into_iter()
            .filter(|record| record.in_semester(semester))
            .collect(),
        None => records,
    }
}

pub fn sessions_or_sample(path: Option<&Path>) -> anyhow::Result<Vec<SessionLogEntry>> {
    match path {
        Some(path) => load_sessions(path),
        None => sample_sessions(),
    }
}

/// Write the sample dataset as CSV files into `dir`.
pub fn write_seed(dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let subjects_path = dir.join(SUBJECTS_FILE);
    let mut writer = csv::Writer::from_path(&subjects_path)
        .with_context(|| format!("failed to create {}", subjects_path.display()))?;
    for record in sample_subjects()? {
        writer.serialize(&record)?;
    }
    writer.flush()?;

    let sessions_path = dir.join(SESSIONS_FILE);
    let mut writer = csv::Writer::from_path(&sessions_path)
        .with_context(|| format!("failed to create {}", sessions_path.display()))?;
    for entry in sample_sessions()? {
        writer.serialize(&entry)?;
    }
    writer.flush()?;

    Ok((subjects_path, sessions_path))
}
