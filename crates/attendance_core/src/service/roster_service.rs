//! Roster use-cases: enrolling students and recording attendance.
//!
//! # Invariants
//! - Enrolment writes the student and its first mark atomically.
//! - Returned records are read back from the store, fully hydrated.

use crate::db::{ConnectionProvider, Session};
use crate::model::attendance::{Attendance, AttendanceDetail, AttendanceStatus};
use crate::model::student::{Student, StudentId};
use crate::repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use crate::repo::{RepoError, RepoResult};
use crate::tx::{with_transaction, TxError, TxResult};
use chrono::NaiveDate;
use log::info;

/// Service wrapper that opens one session per use-case call.
pub struct RosterService<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> RosterService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Saves a new student and its first attendance mark in one transaction.
    ///
    /// When `student_id_override` is set, the mark references that id instead
    /// of the freshly saved student. Callers use it to exercise the
    /// foreign-key rollback path.
    ///
    /// # Errors
    /// - `TxError::Aborted` with the repository failure; nothing is stored.
    pub fn enroll_with_attendance(
        &self,
        student: &Student,
        attendance_date: NaiveDate,
        status: AttendanceStatus,
        student_id_override: Option<StudentId>,
    ) -> TxResult<AttendanceDetail> {
        let mut session = self
            .provider
            .get_session()
            .map_err(|err| TxError::Begin(err.into()))?;

        let detail = with_transaction(&mut session, |session| {
            let students = SqliteStudentRepository::try_new(session)?;
            let marks = SqliteAttendanceRepository::try_new(session)?;

            let saved = students.save(student)?;
            let student_id = match student_id_override {
                Some(id) => id,
                None => saved.require_id()?,
            };
            let mark = marks.save(&Attendance::new(student_id, attendance_date, status))?;
            load_detail(&marks, mark.require_id()?)
        })?;

        info!(
            "event=roster_enroll module=service status=ok student_id={} attendance_id={}",
            detail.student.id.unwrap_or_default(),
            detail.id
        );
        Ok(detail)
    }

    /// Records one mark for an existing student in auto-commit mode.
    pub fn record_attendance(
        &self,
        student_id: StudentId,
        attendance_date: NaiveDate,
        status: AttendanceStatus,
    ) -> RepoResult<AttendanceDetail> {
        let session = self.provider.get_session()?;
        let marks = SqliteAttendanceRepository::try_new(&session)?;
        let mark = marks.save(&Attendance::new(student_id, attendance_date, status))?;
        load_detail(&marks, mark.require_id()?)
    }

    /// Opens a session for direct repository use.
    pub fn session(&self) -> RepoResult<Session> {
        Ok(self.provider.get_session()?)
    }
}

fn load_detail(
    marks: &SqliteAttendanceRepository<'_>,
    id: i64,
) -> RepoResult<AttendanceDetail> {
    marks
        .find_by_id(id)?
        .ok_or_else(|| RepoError::no_rows("attendance", "read_back", Some(id)))
}
