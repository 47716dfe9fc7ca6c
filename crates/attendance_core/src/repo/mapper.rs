//! Row → entity decoding.
//!
//! # Invariants
//! - Functions here are pure: one row in, one value or one `MappingError` out.
//! - The joined attendance row is one-to-one with its student; no grouping.

use crate::model::attendance::{AttendanceDetail, AttendanceStatus};
use crate::model::student::Student;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::FromSql;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stored data cannot be decoded into the domain model (schema drift).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    MissingTable(&'static str),
    MissingColumn { table: &'static str, column: String },
    InvalidValue { column: String, message: String },
    UnknownStatus(String),
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingColumn { table, column } => {
                write!(f, "required column `{column}` is missing from `{table}`")
            }
            Self::InvalidValue { column, message } => {
                write!(f, "invalid value in column `{column}`: {message}")
            }
            Self::UnknownStatus(value) => {
                write!(f, "unknown attendance status `{value}` in attendance.status")
            }
        }
    }
}

impl Error for MappingError {}

/// Decodes a `student` row: `id`, `name`, `class_group`, `create_date`.
pub fn map_student(row: &Row<'_>) -> Result<Student, MappingError> {
    student_from_columns(row, "id")
}

/// Decodes the attendance ⋈ student row.
///
/// Expects `id`, `attendance_date`, `status` from attendance and
/// `student_id`, `name`, `class_group`, `create_date` from student.
pub fn map_attendance_detail(row: &Row<'_>) -> Result<AttendanceDetail, MappingError> {
    let status_text: String = column(row, "attendance", "status")?;
    Ok(AttendanceDetail {
        id: column(row, "attendance", "id")?,
        student: student_from_columns(row, "student_id")?,
        attendance_date: column::<NaiveDate>(row, "attendance", "attendance_date")?,
        status: parse_status(&status_text)?,
    })
}

pub fn parse_status(value: &str) -> Result<AttendanceStatus, MappingError> {
    AttendanceStatus::from_db(value).ok_or_else(|| MappingError::UnknownStatus(value.to_string()))
}

fn student_from_columns(row: &Row<'_>, id_column: &str) -> Result<Student, MappingError> {
    let class_group: Option<String> = column(row, "student", "class_group")?;
    Ok(Student {
        id: Some(column(row, "student", id_column)?),
        name: column(row, "student", "name")?,
        class_group: class_group.unwrap_or_default(),
        created_at: Some(column::<NaiveDateTime>(row, "student", "create_date")?),
    })
}

fn column<T: FromSql>(row: &Row<'_>, table: &'static str, name: &str) -> Result<T, MappingError> {
    row.get(name).map_err(|err| match err {
        rusqlite::Error::InvalidColumnName(_) => MappingError::MissingColumn {
            table,
            column: name.to_string(),
        },
        other => MappingError::InvalidValue {
            column: name.to_string(),
            message: other.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::{map_attendance_detail, map_student, parse_status, MappingError};
    use crate::model::attendance::AttendanceStatus;
    use chrono::NaiveDate;
    use rusqlite::{Connection, Row};

    fn with_row<T>(sql: &str, map: impl FnOnce(&Row<'_>) -> T) -> T {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare(sql).unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().expect("query returns one row");
        map(row)
    }

    #[test]
    fn maps_student_row() {
        let student = with_row(
            "SELECT 4 AS id, 'Ali Hasan' AS name, 'G1' AS class_group,
                    '2024-09-01 08:30:00' AS create_date",
            map_student,
        )
        .unwrap();
        assert_eq!(student.id, Some(4));
        assert_eq!(student.name, "Ali Hasan");
        assert_eq!(student.class_group, "G1");
        let expected = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(student.created_at, Some(expected));
    }

    #[test]
    fn null_class_group_maps_to_empty_label() {
        let student = with_row(
            "SELECT 1 AS id, 'A' AS name, NULL AS class_group,
                    '2024-09-01 08:30:00' AS create_date",
            map_student,
        )
        .unwrap();
        assert_eq!(student.class_group, "");
    }

    #[test]
    fn maps_joined_attendance_row_with_nested_student() {
        let detail = with_row(
            "SELECT 9 AS id, '2024-09-02' AS attendance_date, 'ABSENT' AS status,
                    4 AS student_id, 'Ali Hasan' AS name, 'G1' AS class_group,
                    '2024-09-01 08:30:00' AS create_date",
            map_attendance_detail,
        )
        .unwrap();
        assert_eq!(detail.id, 9);
        assert_eq!(detail.student.id, Some(4));
        assert_eq!(detail.student.name, "Ali Hasan");
        assert_eq!(
            detail.attendance_date,
            NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
        );
        assert_eq!(detail.status, AttendanceStatus::Absent);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let err = with_row("SELECT 1 AS id, 'A' AS name", map_student).unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingColumn {
                table: "student",
                column: "class_group".to_string()
            }
        );
    }

    #[test]
    fn malformed_date_is_invalid_value() {
        let err = with_row(
            "SELECT 9 AS id, 'yesterday' AS attendance_date, 'PRESENT' AS status,
                    4 AS student_id, 'A' AS name, 'G1' AS class_group,
                    '2024-09-01 08:30:00' AS create_date",
            map_attendance_detail,
        )
        .unwrap_err();
        assert!(matches!(err, MappingError::InvalidValue { ref column, .. } if column == "attendance_date"));
    }

    #[test]
    fn unknown_status_text_is_rejected() {
        assert_eq!(
            parse_status("LATE"),
            Err(MappingError::UnknownStatus("LATE".to_string()))
        );
        assert_eq!(parse_status("PRESENT"), Ok(AttendanceStatus::Present));
    }
}
