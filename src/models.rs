use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, AttendanceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Computer Science")]
    ComputerScience,
    #[serde(rename = "Information Technology")]
    InformationTechnology,
    #[serde(rename = "Electrical Engineering")]
    ElectricalEngineering,
}

impl Department {
    pub const ALL: [Department; 3] = [
        Department::ComputerScience,
        Department::InformationTechnology,
        Department::ElectricalEngineering,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Department::ComputerScience => "Computer Science",
            Department::InformationTechnology => "Information Technology",
            Department::ElectricalEngineering => "Electrical Engineering",
        }
    }

    /// Two-letter prefix used in roll numbers.
    pub fn code(self) -> &'static str {
        match self {
            Department::ComputerScience => "CS",
            Department::InformationTechnology => "IT",
            Department::ElectricalEngineering => "EE",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Department {
    type Err = AttendanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Department::ALL
            .into_iter()
            .find(|dept| {
                dept.name().eq_ignore_ascii_case(value) || dept.code().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| AttendanceError::validation(format!("unknown department '{value}'")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionSlot {
    #[default]
    #[serde(rename = "FN")]
    Forenoon,
    #[serde(rename = "AN")]
    Afternoon,
}

impl SessionSlot {
    pub fn code(self) -> &'static str {
        match self {
            SessionSlot::Forenoon => "FN",
            SessionSlot::Afternoon => "AN",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SessionSlot::Forenoon => "Forenoon",
            SessionSlot::Afternoon => "Afternoon",
        }
    }
}

impl fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SessionSlot {
    type Err = AttendanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        [SessionSlot::Forenoon, SessionSlot::Afternoon]
            .into_iter()
            .find(|slot| {
                slot.code().eq_ignore_ascii_case(value) || slot.name().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| AttendanceError::validation(format!("unknown session slot '{value}'")))
    }
}

/// Identifies one attendance-taking event.
///
/// Fields are optional because the descriptor mirrors a partially filled
/// form; [`ClassSessionDescriptor::validate`] enforces completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSessionDescriptor {
    pub department: Option<Department>,
    pub batch: String,
    pub date: Option<NaiveDate>,
    pub slot: SessionSlot,
}

impl ClassSessionDescriptor {
    #[cfg(test)]
    pub fn new(department: Department, batch: &str, date: NaiveDate, slot: SessionSlot) -> Self {
        Self {
            department: Some(department),
            batch: batch.to_string(),
            date: Some(date),
            slot,
        }
    }

    /// Build a descriptor from raw form values. Blank values are treated
    /// as absent; values that are present but unparseable are rejected.
    pub fn from_form(
        department: Option<&str>,
        batch: Option<&str>,
        date: Option<&str>,
        slot: Option<&str>,
    ) -> AttendanceResult<Self> {
        let department = non_blank(department)
            .map(str::parse::<Department>)
            .transpose()?;
        let date = non_blank(date)
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AttendanceError::validation(format!("invalid date '{raw}'")))
            })
            .transpose()?;
        let slot = non_blank(slot)
            .map(str::parse::<SessionSlot>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            department,
            batch: non_blank(batch).unwrap_or_default().to_string(),
            date,
            slot,
        })
    }

    pub fn validate(&self) -> AttendanceResult<()> {
        if self.department.is_none() || self.batch.trim().is_empty() || self.date.is_none() {
            return Err(AttendanceError::validation("missing required field"));
        }
        self.batch_years().map(|_| ())
    }

    /// Start and end years of the batch label, e.g. `2022-2026`.
    pub fn batch_years(&self) -> AttendanceResult<(i32, i32)> {
        let invalid = || {
            AttendanceError::validation(format!(
                "invalid batch '{}', expected <startYear>-<endYear>",
                self.batch
            ))
        };
        let (start, end) = self.batch.trim().split_once('-').ok_or_else(invalid)?;
        let parse_year = |raw: &str| {
            let raw = raw.trim();
            if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            raw.parse::<i32>().map_err(|_| invalid())
        };
        let (start, end) = (parse_year(start)?, parse_year(end)?);
        if end <= start {
            return Err(invalid());
        }
        Ok((start, end))
    }

    /// Last two digits of the batch start year.
    pub fn batch_year_suffix(&self) -> AttendanceResult<String> {
        let (start, _) = self.batch_years()?;
        Ok(format!("{:02}", start % 100))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub sequence_number: u32,
    pub display_name: String,
    pub roll_number: String,
    pub is_present: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSubmissionResult {
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
}

/// Semester assumed for records that do not name one.
pub const CURRENT_SEMESTER: &str = "Current";

/// Historical attendance for one subject. The percentage is always
/// derived from `present` and `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAttendanceRecord {
    pub subject_name: String,
    pub present: u32,
    pub total: u32,
    pub semester: Option<String>,
}

impl SubjectAttendanceRecord {
    pub fn new(subject_name: &str, present: u32, total: u32) -> AttendanceResult<Self> {
        if subject_name.trim().is_empty() {
            return Err(AttendanceError::validation("subject name is required"));
        }
        if present > total {
            return Err(AttendanceError::validation(format!(
                "{subject_name}: present ({present}) exceeds total ({total})"
            )));
        }
        Ok(Self {
            subject_name: subject_name.trim().to_string(),
            present,
            total,
            semester: None,
        })
    }

    pub fn with_semester(mut self, semester: Option<&str>) -> Self {
        self.semester = non_blank(semester).map(str::to_string);
        self
    }

    pub fn semester(&self) -> &str {
        self.semester.as_deref().unwrap_or(CURRENT_SEMESTER)
    }

    pub fn in_semester(&self, semester: &str) -> bool {
        self.semester().eq_ignore_ascii_case(semester.trim())
    }

    pub fn percentage(&self) -> f64 {
        crate::stats::compute_subject_percentage(self.present, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttendanceStatus {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
}

impl AttendanceStatus {
    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Excellent => "Excellent",
            AttendanceStatus::Good => "Good",
            AttendanceStatus::Satisfactory => "Satisfactory",
            AttendanceStatus::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskStatus {
    Safe,
    AtRisk,
}

impl RiskStatus {
    pub fn label(self) -> &'static str {
        match self {
            RiskStatus::Safe => "Safe",
            RiskStatus::AtRisk => "At Risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceMark {
    Present,
    Absent,
}

impl PresenceMark {
    pub fn label(self) -> &'static str {
        match self {
            PresenceMark::Present => "present",
            PresenceMark::Absent => "absent",
        }
    }
}

/// One recorded present/absent mark for a subject on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub date: NaiveDate,
    pub subject_name: String,
    pub status: PresenceMark,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectSummary {
    pub subject_name: String,
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
    pub status: AttendanceStatus,
    pub below_threshold: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummary {
    pub subjects: Vec<SubjectSummary>,
    pub total_present: u64,
    pub total_sessions: u64,
    pub overall_percentage: f64,
    pub overall_status: AttendanceStatus,
    pub minimum_threshold: f64,
    pub risk_status: RiskStatus,
    pub sessions_to_recover: Option<u64>,
}
