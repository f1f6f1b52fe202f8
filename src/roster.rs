use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{ClassSessionDescriptor, RosterEntry, SessionSubmissionResult};

pub const DEFAULT_ROSTER_MIN: usize = 30;
pub const DEFAULT_ROSTER_MAX: usize = 40;

/// How many placeholder students a generated roster holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSizePolicy {
    /// Uniformly drawn from the closed range `min..=max`.
    Random { min: usize, max: usize },
    Fixed(usize),
}

impl Default for RosterSizePolicy {
    fn default() -> Self {
        RosterSizePolicy::Random {
            min: DEFAULT_ROSTER_MIN,
            max: DEFAULT_ROSTER_MAX,
        }
    }
}

impl RosterSizePolicy {
    pub fn validate(&self) -> AttendanceResult<()> {
        match *self {
            RosterSizePolicy::Random { min, max } if min == 0 || min > max => Err(
                AttendanceError::validation(format!("invalid roster size range {min}..={max}")),
            ),
            RosterSizePolicy::Fixed(0) => {
                Err(AttendanceError::validation("roster size must be positive"))
            }
            _ => Ok(()),
        }
    }

    pub fn pick<R: Rng>(&self, rng: &mut R) -> AttendanceResult<usize> {
        self.validate()?;
        Ok(match *self {
            RosterSizePolicy::Random { min, max } => rng.gen_range(min..=max),
            RosterSizePolicy::Fixed(size) => size,
        })
    }
}

pub fn roll_number(
    descriptor: &ClassSessionDescriptor,
    sequence_number: u32,
) -> AttendanceResult<String> {
    let department = descriptor
        .department
        .ok_or_else(|| AttendanceError::validation("missing required field"))?;
    Ok(format!(
        "{}{}{:03}",
        department.code(),
        descriptor.batch_year_suffix()?,
        sequence_number
    ))
}

/// Build a fresh roster for a class session, every student marked present.
pub fn generate_roster(
    descriptor: &ClassSessionDescriptor,
    policy: &RosterSizePolicy,
) -> AttendanceResult<Vec<RosterEntry>> {
    generate_roster_with_rng(descriptor, policy, &mut rand::thread_rng())
}

pub fn generate_roster_with_rng<R: Rng>(
    descriptor: &ClassSessionDescriptor,
    policy: &RosterSizePolicy,
    rng: &mut R,
) -> AttendanceResult<Vec<RosterEntry>> {
    descriptor.validate()?;
    let size = policy.pick(rng)?;
    let count = u32::try_from(size)
        .map_err(|_| AttendanceError::validation(format!("roster size {size} is too large")))?;

    let roster = (1..=count)
        .map(|sequence_number| {
            Ok(RosterEntry {
                sequence_number,
                display_name: format!("Student {sequence_number}"),
                roll_number: roll_number(descriptor, sequence_number)?,
                is_present: true,
            })
        })
        .collect::<AttendanceResult<Vec<_>>>()?;

    tracing::debug!(
        department = ?descriptor.department,
        batch = %descriptor.batch,
        size = roster.len(),
        "roster generated"
    );
    Ok(roster)
}

/// Flip presence for one entry and return its new value. Unknown sequence
/// numbers leave the roster untouched.
pub fn toggle_attendance(
    roster: &mut [RosterEntry],
    sequence_number: u32,
) -> AttendanceResult<bool> {
    let entry = roster
        .iter_mut()
        .find(|entry| entry.sequence_number == sequence_number)
        .ok_or(AttendanceError::NotFound(sequence_number))?;
    entry.is_present = !entry.is_present;
    Ok(entry.is_present)
}

/// Mark one entry absent. Marking an already absent entry is a no-op.
pub fn mark_absent(roster: &mut [RosterEntry], sequence_number: u32) -> AttendanceResult<()> {
    let entry = roster
        .iter_mut()
        .find(|entry| entry.sequence_number == sequence_number)
        .ok_or(AttendanceError::NotFound(sequence_number))?;
    entry.is_present = false;
    Ok(())
}

pub fn submit_attendance(roster: &[RosterEntry]) -> AttendanceResult<SessionSubmissionResult> {
    if roster.is_empty() {
        return Err(AttendanceError::validation("empty roster"));
    }

    let absent_count = roster.iter().filter(|entry| !entry.is_present).count();
    Ok(SessionSubmissionResult {
        total_students: roster.len(),
        present_count: roster.len() - absent_count,
        absent_count,
    })
}

/// The single owner of a roster while a faculty member is taking
/// attendance for one session.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSheet {
    session_id: Option<Uuid>,
    descriptor: Option<ClassSessionDescriptor>,
    roster: Vec<RosterEntry>,
    submission: Option<SessionSubmissionResult>,
}

impl Default for AttendanceSheet {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceSheet {
    pub fn new() -> Self {
        Self {
            session_id: None,
            descriptor: None,
            roster: Vec::new(),
            submission: None,
        }
    }

    /// Replace the current roster with a new one for `descriptor` and clear
    /// any previous submission. On error the sheet is left as it was.
    pub fn generate(
        &mut self,
        descriptor: ClassSessionDescriptor,
        policy: &RosterSizePolicy,
    ) -> AttendanceResult<&[RosterEntry]> {
        let roster = generate_roster(&descriptor, policy)?;
        let session_id = Uuid::new_v4();
        tracing::info!(%session_id, students = roster.len(), "attendance sheet opened");

        self.session_id = Some(session_id);
        self.descriptor = Some(descriptor);
        self.roster = roster;
        self.submission = None;
        Ok(&self.roster)
    }

    pub fn toggle(&mut self, sequence_number: u32) -> AttendanceResult<bool> {
        let is_present = toggle_attendance(&mut self.roster, sequence_number)?;
        tracing::debug!(sequence_number, is_present, "attendance toggled");
        Ok(is_present)
    }

    pub fn mark_absent(&mut self, sequence_number: u32) -> AttendanceResult<()> {
        mark_absent(&mut self.roster, sequence_number)?;
        tracing::debug!(sequence_number, "marked absent");
        Ok(())
    }

    pub fn submit(&mut self) -> AttendanceResult<SessionSubmissionResult> {
        let result = submit_attendance(&self.roster)?;
        tracing::info!(
            session_id = ?self.session_id,
            total = result.total_students,
            absent = result.absent_count,
            "attendance submitted"
        );
        self.submission = Some(result);
        Ok(result)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn descriptor(&self) -> Option<&ClassSessionDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn submission(&self) -> Option<SessionSubmissionResult> {
        self.submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Department, SessionSlot};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn descriptor(department: Department, batch: &str) -> ClassSessionDescriptor {
        ClassSessionDescriptor::new(
            department,
            batch,
            NaiveDate::from_ymd_opt(2025, 5, 18).unwrap(),
            SessionSlot::Forenoon,
        )
    }

    fn fixed_roster(size: usize) -> Vec<RosterEntry> {
        generate_roster(
            &descriptor(Department::ComputerScience, "2022-2026"),
            &RosterSizePolicy::Fixed(size),
        )
        .unwrap()
    }

    #[test]
    fn default_policy_produces_contiguous_present_roster() {
        let desc = descriptor(Department::InformationTechnology, "2023-2027");
        for _ in 0..50 {
            let roster = generate_roster(&desc, &RosterSizePolicy::default()).unwrap();
            assert!((30..=40).contains(&roster.len()));

            let sequences: Vec<u32> = roster.iter().map(|e| e.sequence_number).collect();
            let expected: Vec<u32> = (1..=roster.len() as u32).collect();
            assert_eq!(sequences, expected);

            let rolls: HashSet<&str> = roster.iter().map(|e| e.roll_number.as_str()).collect();
            assert_eq!(rolls.len(), roster.len());
            assert!(roster.iter().all(|e| e.is_present));
        }
    }

    #[test]
    fn seeded_rng_gives_reproducible_size() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let desc = descriptor(Department::ComputerScience, "2022-2026");
        let policy = RosterSizePolicy::default();
        let first =
            generate_roster_with_rng(&desc, &policy, &mut StdRng::seed_from_u64(7)).unwrap();
        let second =
            generate_roster_with_rng(&desc, &policy, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(first, second);
        assert!((30..=40).contains(&first.len()));
    }

    #[test]
    fn roll_number_combines_code_year_and_sequence() {
        let roster = fixed_roster(35);
        assert_eq!(roster[6].roll_number, "CS22007");
        assert_eq!(roster[6].display_name, "Student 7");
        assert_eq!(roster[34].roll_number, "CS22035");

        let ee = descriptor(Department::ElectricalEngineering, "2024-2028");
        assert_eq!(roll_number(&ee, 112).unwrap(), "EE24112");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut desc = descriptor(Department::ComputerScience, "2022-2026");
        desc.date = None;
        let err = generate_roster(&desc, &RosterSizePolicy::default()).unwrap_err();
        assert_eq!(err, AttendanceError::validation("missing required field"));

        let mut desc = descriptor(Department::ComputerScience, "");
        assert!(generate_roster(&desc, &RosterSizePolicy::default()).is_err());
        desc.batch = "2022-2026".to_string();
        desc.department = None;
        assert!(generate_roster(&desc, &RosterSizePolicy::default()).is_err());
    }

    #[test]
    fn invalid_size_policies_are_rejected() {
        let desc = descriptor(Department::ComputerScience, "2022-2026");
        assert!(generate_roster(&desc, &RosterSizePolicy::Fixed(0)).is_err());
        assert!(generate_roster(&desc, &RosterSizePolicy::Random { min: 40, max: 30 }).is_err());
        let roster = generate_roster(&desc, &RosterSizePolicy::Random { min: 5, max: 5 }).unwrap();
        assert_eq!(roster.len(), 5);
    }

    #[test]
    fn toggle_twice_restores_roster() {
        let original = fixed_roster(35);
        let mut roster = original.clone();

        assert_eq!(toggle_attendance(&mut roster, 12), Ok(false));
        for (before, after) in original.iter().zip(&roster) {
            if before.sequence_number == 12 {
                assert_eq!(
                    after,
                    &RosterEntry {
                        is_present: false,
                        ..before.clone()
                    }
                );
            } else {
                assert_eq!(before, after);
            }
        }

        assert_eq!(toggle_attendance(&mut roster, 12), Ok(true));
        assert_eq!(roster, original);
    }

    #[test]
    fn toggle_unknown_entry_is_not_found() {
        let original = fixed_roster(30);
        let mut roster = original.clone();
        assert_eq!(
            toggle_attendance(&mut roster, 31),
            Err(AttendanceError::NotFound(31))
        );
        assert_eq!(roster, original);
    }

    #[test]
    fn submission_counts_absentees() {
        let mut roster = fixed_roster(35);
        for seq in [2, 9, 17, 23, 35] {
            toggle_attendance(&mut roster, seq).unwrap();
        }

        let result = submit_attendance(&roster).unwrap();
        assert_eq!(
            result,
            SessionSubmissionResult {
                total_students: 35,
                present_count: 30,
                absent_count: 5,
            }
        );
        assert_eq!(submit_attendance(&roster).unwrap(), result);
    }

    #[test]
    fn marking_absent_twice_keeps_entry_absent() {
        let mut sheet = AttendanceSheet::new();
        sheet
            .generate(
                descriptor(Department::ComputerScience, "2022-2026"),
                &RosterSizePolicy::Fixed(30),
            )
            .unwrap();
        for seq in [3, 3, 8] {
            sheet.mark_absent(seq).unwrap();
        }
        assert!(!sheet.roster()[2].is_present);
        assert_eq!(sheet.submit().unwrap().absent_count, 2);

        let before = sheet.roster().to_vec();
        assert_eq!(sheet.mark_absent(99), Err(AttendanceError::NotFound(99)));
        assert_eq!(sheet.roster(), before.as_slice());
    }

    #[test]
    fn empty_roster_cannot_be_submitted() {
        assert_eq!(
            submit_attendance(&[]),
            Err(AttendanceError::validation("empty roster"))
        );
    }

    #[test]
    fn sheet_resets_submission_on_regeneration() {
        let mut sheet = AttendanceSheet::new();
        assert!(sheet.submit().is_err());

        sheet
            .generate(
                descriptor(Department::ComputerScience, "2022-2026"),
                &RosterSizePolicy::Fixed(32),
            )
            .unwrap();
        let first_session = sheet.session_id();
        sheet.toggle(1).unwrap();
        let first = sheet.submit().unwrap();
        assert_eq!(first.absent_count, 1);

        sheet.toggle(2).unwrap();
        let second = sheet.submit().unwrap();
        assert_eq!(second.absent_count, 2);
        assert_eq!(sheet.submission(), Some(second));

        let kept = sheet.roster().to_vec();
        sheet
            .generate(
                descriptor(Department::ElectricalEngineering, "2024-2028"),
                &RosterSizePolicy::Fixed(31),
            )
            .unwrap();
        assert_eq!(sheet.submission(), None);
        assert_ne!(sheet.session_id(), first_session);
        assert_eq!(sheet.roster().len(), 31);
        assert!(sheet.roster().iter().all(|e| e.is_present));
        assert!(sheet.roster()[0].roll_number.starts_with("EE24"));
        assert!(!kept[0].is_present);
        assert_eq!(kept[0].roll_number, "CS22001");
    }

    #[test]
    fn failed_generation_keeps_previous_sheet() {
        let mut sheet = AttendanceSheet::new();
        sheet
            .generate(
                descriptor(Department::ComputerScience, "2022-2026"),
                &RosterSizePolicy::Fixed(30),
            )
            .unwrap();
        sheet.submit().unwrap();

        let mut bad = descriptor(Department::ComputerScience, "2022-2026");
        bad.department = None;
        assert!(sheet.generate(bad, &RosterSizePolicy::Fixed(30)).is_err());
        assert_eq!(sheet.roster().len(), 30);
        assert!(sheet.submission().is_some());
        assert_eq!(
            sheet.descriptor().and_then(|d| d.department),
            Some(Department::ComputerScience)
        );
    }
}
