//! Attendance repository contract and SQLite implementation.
//!
//! # Invariants
//! - Reads always join `student` and return `AttendanceDetail`.
//! - Writes take the foreign-key shape `Attendance`.
//! - `delete` never cascades to `student`.

use super::mapper::map_attendance_detail;
use super::{ensure_table_ready, RepoError, RepoResult};
use crate::db::schema::{ATTENDANCE_COLUMNS, STUDENT_COLUMNS};
use crate::db::Session;
use crate::model::attendance::{Attendance, AttendanceDetail, AttendanceId};
use crate::model::student::StudentId;
use crate::model::ValidationError;
use log::debug;
use rusqlite::params;
use rusqlite::types::ToSql;

const ATTENDANCE_DETAIL_SELECT_SQL: &str = "SELECT
    a.id,
    a.attendance_date,
    a.status,
    s.id AS student_id,
    s.name,
    s.class_group,
    s.create_date
FROM attendance a
INNER JOIN student s ON s.id = a.student_id";

/// CRUD over the `attendance` table with student hydration on reads.
pub trait AttendanceRepository {
    /// Inserts a mark for an already persisted student.
    fn save(&self, attendance: &Attendance) -> RepoResult<Attendance>;
    fn find_all(&self) -> RepoResult<Vec<AttendanceDetail>>;
    fn find_by_id(&self, id: AttendanceId) -> RepoResult<Option<AttendanceDetail>>;
    /// All marks of one student, oldest date first.
    fn find_by_student(&self, student_id: StudentId) -> RepoResult<Vec<AttendanceDetail>>;
    /// Rewrites `student_id`, `attendance_date` and `status`.
    fn update(&self, attendance: &Attendance) -> RepoResult<()>;
    fn delete(&self, id: AttendanceId) -> RepoResult<bool>;
}

/// SQLite-backed attendance repository bound to one session.
pub struct SqliteAttendanceRepository<'s> {
    session: &'s Session,
}

impl<'s> SqliteAttendanceRepository<'s> {
    /// Binds to `session` after checking both joined tables.
    pub fn try_new(session: &'s Session) -> RepoResult<Self> {
        ensure_table_ready(session, "attendance", ATTENDANCE_COLUMNS)?;
        ensure_table_ready(session, "student", STUDENT_COLUMNS)?;
        Ok(Self { session })
    }

    fn query_details(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> RepoResult<Vec<AttendanceDetail>> {
        self.session.ensure_usable()?;
        let mut stmt = self.session.connection().prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(map_attendance_detail(row)?);
        }
        Ok(records)
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn save(&self, attendance: &Attendance) -> RepoResult<Attendance> {
        if let Some(id) = attendance.id {
            return Err(ValidationError::IdAlreadyAssigned {
                entity: "attendance",
                id,
            }
            .into());
        }
        attendance.validate()?;
        self.session.ensure_usable()?;

        let conn = self.session.connection();
        let changed = conn.execute(
            "INSERT INTO attendance (student_id, attendance_date, status)
             VALUES (?1, ?2, ?3);",
            params![
                attendance.student_id,
                attendance.attendance_date,
                attendance.status.as_db_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::no_rows("attendance", "insert", None));
        }

        let id = conn.last_insert_rowid();
        debug!(
            "event=attendance_save module=repo status=ok id={id} student_id={}",
            attendance.student_id
        );
        Ok(attendance.with_id(id))
    }

    fn find_all(&self) -> RepoResult<Vec<AttendanceDetail>> {
        let records = self.query_details(
            &format!("{ATTENDANCE_DETAIL_SELECT_SQL} ORDER BY a.id ASC;"),
            params![],
        )?;
        debug!(
            "event=attendance_find_all module=repo status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    fn find_by_id(&self, id: AttendanceId) -> RepoResult<Option<AttendanceDetail>> {
        let records = self.query_details(
            &format!("{ATTENDANCE_DETAIL_SELECT_SQL} WHERE a.id = ?1;"),
            params![id],
        )?;
        Ok(records.into_iter().next())
    }

    fn find_by_student(&self, student_id: StudentId) -> RepoResult<Vec<AttendanceDetail>> {
        self.query_details(
            &format!(
                "{ATTENDANCE_DETAIL_SELECT_SQL}
                 WHERE a.student_id = ?1
                 ORDER BY a.attendance_date ASC, a.id ASC;"
            ),
            params![student_id],
        )
    }

    fn update(&self, attendance: &Attendance) -> RepoResult<()> {
        let id = attendance.require_id()?;
        attendance.validate()?;
        self.session.ensure_usable()?;

        let changed = self.session.connection().execute(
            "UPDATE attendance
             SET
                student_id = ?1,
                attendance_date = ?2,
                status = ?3
             WHERE id = ?4;",
            params![
                attendance.student_id,
                attendance.attendance_date,
                attendance.status.as_db_str(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::no_rows("attendance", "update", Some(id)));
        }

        debug!("event=attendance_update module=repo status=ok id={id}");
        Ok(())
    }

    fn delete(&self, id: AttendanceId) -> RepoResult<bool> {
        self.session.ensure_usable()?;
        let changed = self
            .session
            .connection()
            .execute("DELETE FROM attendance WHERE id = ?1;", [id])?;

        debug!("event=attendance_delete module=repo status=ok id={id} removed={changed}");
        Ok(changed > 0)
    }
}
