//! Attendance entity in its write and read shapes.
//!
//! # Invariants
//! - `Attendance` references its student by foreign key only.
//! - `AttendanceDetail` is produced by joined reads and always carries the full
//!   student row.
//! - `attendance_date` is a calendar date without time of day.

use super::student::{Student, StudentId};
use super::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned attendance identifier.
pub type AttendanceId = i64;

/// Attendance mark for one student on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// Text persisted in `attendance.status`.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
        }
    }

    /// Decodes persisted text. Matching is exact; the store only holds the
    /// canonical upper-case names.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "PRESENT" => Some(Self::Present),
            "ABSENT" => Some(Self::Absent),
            _ => None,
        }
    }
}

/// Write shape: what `save`/`update` send to the `attendance` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Option<AttendanceId>,
    pub student_id: StudentId,
    pub attendance_date: NaiveDate,
    pub status: AttendanceStatus,
}

impl Attendance {
    /// Creates an unsaved attendance mark for a student id.
    pub fn new(student_id: StudentId, attendance_date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            id: None,
            student_id,
            attendance_date,
            status,
        }
    }

    /// Creates an unsaved mark for an already persisted student.
    ///
    /// # Errors
    /// - `MissingId` when `student` has not been saved yet.
    pub fn for_student(
        student: &Student,
        attendance_date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(student.require_id()?, attendance_date, status))
    }

    /// Checks that the foreign key can only have come from the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.student_id <= 0 {
            return Err(ValidationError::UnsavedStudent(self.student_id));
        }
        Ok(())
    }

    pub fn require_id(&self) -> Result<AttendanceId, ValidationError> {
        self.id.ok_or(ValidationError::MissingId("attendance"))
    }

    /// Returns a copy carrying the generated id.
    pub fn with_id(&self, id: AttendanceId) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }
}

/// Read shape: one attendance row joined with its student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceDetail {
    pub id: AttendanceId,
    pub student: Student,
    pub attendance_date: NaiveDate,
    pub status: AttendanceStatus,
}

impl AttendanceDetail {
    /// Converts back to the write shape, e.g. to feed `update`.
    ///
    /// # Errors
    /// - `MissingId` when the nested student carries no id, which a joined read
    ///   never produces.
    pub fn to_attendance(&self) -> Result<Attendance, ValidationError> {
        Ok(Attendance {
            id: Some(self.id),
            student_id: self.student.require_id()?,
            attendance_date: self.attendance_date,
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Attendance, AttendanceDetail, AttendanceStatus};
    use crate::model::student::Student;
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    #[test]
    fn status_text_is_canonical_upper_case() {
        for status in [AttendanceStatus::Present, AttendanceStatus::Absent] {
            assert_eq!(AttendanceStatus::from_db(status.as_db_str()), Some(status));
        }
        assert_eq!(AttendanceStatus::from_db("present"), None);
        assert_eq!(AttendanceStatus::from_db("LATE"), None);
    }

    #[test]
    fn for_student_requires_saved_student() {
        let unsaved = Student::new("A", "G1");
        let err = Attendance::for_student(&unsaved, day(), AttendanceStatus::Present)
            .expect_err("unsaved student must be rejected");
        assert_eq!(err, ValidationError::MissingId("student"));

        let saved = unsaved.with_id(3);
        let mark = Attendance::for_student(&saved, day(), AttendanceStatus::Absent).unwrap();
        assert_eq!(mark.student_id, 3);
        assert_eq!(mark.id, None);
    }

    #[test]
    fn validate_rejects_non_positive_student_id() {
        let mark = Attendance::new(0, day(), AttendanceStatus::Present);
        assert_eq!(mark.validate(), Err(ValidationError::UnsavedStudent(0)));
    }

    #[test]
    fn detail_converts_to_write_shape() {
        let detail = AttendanceDetail {
            id: 11,
            student: Student::new("A", "G1").with_id(4),
            attendance_date: day(),
            status: AttendanceStatus::Absent,
        };
        let mark = detail.to_attendance().unwrap();
        assert_eq!(mark.id, Some(11));
        assert_eq!(mark.student_id, 4);
        assert_eq!(mark.status, AttendanceStatus::Absent);
    }

    #[test]
    fn status_serializes_as_upper_case_name() {
        let json = serde_json::to_string(&AttendanceStatus::Absent).unwrap();
        assert_eq!(json, "\"ABSENT\"");
    }
}
