//! Student repository contract and SQLite implementation.
//!
//! # Invariants
//! - `save` never writes `id` or `create_date`; both come from the store.
//! - `update` never touches `id` or `create_date`.
//! - `find_all` is ordered by `id ASC`.

use super::mapper::map_student;
use super::{ensure_table_ready, RepoError, RepoResult};
use crate::db::schema::STUDENT_COLUMNS;
use crate::db::Session;
use crate::model::student::{Student, StudentId};
use crate::model::ValidationError;
use log::debug;
use rusqlite::params;

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    class_group,
    create_date
FROM student";

/// CRUD over the `student` table.
pub trait StudentRepository {
    /// Inserts a new student and returns it with the generated id.
    fn save(&self, student: &Student) -> RepoResult<Student>;
    fn find_all(&self) -> RepoResult<Vec<Student>>;
    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Replaces `name` and `class_group` of an existing student.
    fn update(&self, student: &Student) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn delete(&self, id: StudentId) -> RepoResult<bool>;
}

/// SQLite-backed student repository bound to one session.
pub struct SqliteStudentRepository<'s> {
    session: &'s Session,
}

impl<'s> SqliteStudentRepository<'s> {
    /// Binds to `session` after checking the `student` table shape.
    pub fn try_new(session: &'s Session) -> RepoResult<Self> {
        ensure_table_ready(session, "student", STUDENT_COLUMNS)?;
        Ok(Self { session })
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn save(&self, student: &Student) -> RepoResult<Student> {
        if let Some(id) = student.id {
            return Err(ValidationError::IdAlreadyAssigned {
                entity: "student",
                id,
            }
            .into());
        }
        student.validate()?;
        self.session.ensure_usable()?;

        let conn = self.session.connection();
        let changed = conn.execute(
            "INSERT INTO student (name, class_group) VALUES (?1, ?2);",
            params![student.name.as_str(), student.class_group.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::no_rows("student", "insert", None));
        }

        let id = conn.last_insert_rowid();
        debug!("event=student_save module=repo status=ok id={id}");
        Ok(student.with_id(id))
    }

    fn find_all(&self) -> RepoResult<Vec<Student>> {
        self.session.ensure_usable()?;
        let mut stmt = self
            .session
            .connection()
            .prepare(&format!("{STUDENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(map_student(row)?);
        }

        debug!(
            "event=student_find_all module=repo status=ok count={}",
            students.len()
        );
        Ok(students)
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
        self.session.ensure_usable()?;
        let mut stmt = self
            .session
            .connection()
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(map_student(row)?));
        }

        Ok(None)
    }

    fn update(&self, student: &Student) -> RepoResult<()> {
        let id = student.require_id()?;
        student.validate()?;
        self.session.ensure_usable()?;

        let changed = self.session.connection().execute(
            "UPDATE student
             SET
                name = ?1,
                class_group = ?2
             WHERE id = ?3;",
            params![student.name.as_str(), student.class_group.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::no_rows("student", "update", Some(id)));
        }

        debug!("event=student_update module=repo status=ok id={id}");
        Ok(())
    }

    fn delete(&self, id: StudentId) -> RepoResult<bool> {
        self.session.ensure_usable()?;
        let changed = self
            .session
            .connection()
            .execute("DELETE FROM student WHERE id = ?1;", [id])?;

        debug!("event=student_delete module=repo status=ok id={id} removed={changed}");
        Ok(changed > 0)
    }
}
