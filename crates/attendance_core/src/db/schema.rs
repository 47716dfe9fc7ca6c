//! Fixed student/attendance schema.
//!
//! # Invariants
//! - Install is idempotent (`IF NOT EXISTS`) and atomic.
//! - There is no versioning; a changed schema is detected by repository
//!   readiness checks, not migrated.

use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Tables and columns the repositories read and write.
pub const STUDENT_COLUMNS: &[&str] = &["id", "name", "class_group", "create_date"];
pub const ATTENDANCE_COLUMNS: &[&str] = &["id", "student_id", "attendance_date", "status"];

/// Creates missing tables and indexes in one transaction.
pub fn install_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.commit()
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let mut rows = stmt.query([table])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(0)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{install_schema, table_exists, table_has_column, ATTENDANCE_COLUMNS};
    use rusqlite::Connection;

    #[test]
    fn install_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        install_schema(&mut conn).unwrap();
        install_schema(&mut conn).unwrap();

        assert!(table_exists(&conn, "student").unwrap());
        for column in ATTENDANCE_COLUMNS {
            assert!(table_has_column(&conn, "attendance", column).unwrap());
        }
        assert!(!table_has_column(&conn, "attendance", "note").unwrap());
    }
}
