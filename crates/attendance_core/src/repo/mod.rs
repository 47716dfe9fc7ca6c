//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide CRUD over `student` and `attendance` with fixed, parameterized SQL.
//! - Translate SQLite failures into the core error taxonomy.
//!
//! # Invariants
//! - Validation runs before any statement is sent.
//! - "Not found" is `Ok(None)`; store failures are always `Err`.
//! - Writes that must touch one row and touch none fail with
//!   `PersistenceError::NoRowsAffected`.

use crate::db::schema::{table_exists, table_has_column};
use crate::db::{ConnectionError, Session};
use crate::model::ValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance_repo;
pub mod mapper;
pub mod student_repo;

use mapper::MappingError;

pub type RepoResult<T> = Result<T, RepoError>;

/// A write reached the store but did not have the expected effect.
#[derive(Debug)]
pub enum PersistenceError {
    /// `UPDATE`/`INSERT` matched no row.
    NoRowsAffected {
        table: &'static str,
        operation: &'static str,
        id: Option<i64>,
    },
    /// Foreign key, `NOT NULL` or `CHECK` rejected the statement.
    ConstraintViolation(rusqlite::Error),
    /// Any other statement failure.
    Store(rusqlite::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRowsAffected {
                table,
                operation,
                id: Some(id),
            } => write!(f, "{operation} on `{table}` affected no rows for id {id}"),
            Self::NoRowsAffected {
                table,
                operation,
                id: None,
            } => write!(f, "{operation} on `{table}` affected no rows"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoRowsAffected { .. } => None,
            Self::ConstraintViolation(err) | Self::Store(err) => Some(err),
        }
    }
}

/// Error returned by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    Connection(ConnectionError),
    Validation(ValidationError),
    Persistence(PersistenceError),
    Mapping(MappingError),
}

impl RepoError {
    /// Short stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Validation(_) => "validation",
            Self::Persistence(PersistenceError::NoRowsAffected { .. }) => "no_rows_affected",
            Self::Persistence(PersistenceError::ConstraintViolation(_)) => "constraint_violation",
            Self::Persistence(PersistenceError::Store(_)) => "store",
            Self::Mapping(_) => "mapping",
        }
    }

    pub(crate) fn no_rows(table: &'static str, operation: &'static str, id: Option<i64>) -> Self {
        Self::Persistence(PersistenceError::NoRowsAffected {
            table,
            operation,
            id,
        })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::Mapping(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Mapping(err) => Some(err),
        }
    }
}

impl From<ConnectionError> for RepoError {
    fn from(value: ConnectionError) -> Self {
        Self::Connection(value)
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MappingError> for RepoError {
    fn from(value: MappingError) -> Self {
        Self::Mapping(value)
    }
}

impl From<PersistenceError> for RepoError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => {
                Self::Persistence(PersistenceError::ConstraintViolation(value))
            }
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure,
            ) => Self::Connection(ConnectionError::Unavailable(value)),
            _ => Self::Persistence(PersistenceError::Store(value)),
        }
    }
}

/// Checks that `table` exists with every column in `columns`.
pub(crate) fn ensure_table_ready(
    session: &Session,
    table: &'static str,
    columns: &[&str],
) -> RepoResult<()> {
    session.ensure_usable()?;
    let conn = session.connection();
    if !table_exists(conn, table)? {
        return Err(MappingError::MissingTable(table).into());
    }
    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(MappingError::MissingColumn {
                table,
                column: (*column).to_string(),
            }
            .into());
        }
    }
    Ok(())
}
