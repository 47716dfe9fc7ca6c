//! Transactional persistence for students and their attendance records.
//!
//! Sessions come from a `ConnectionProvider`; repositories run on a borrowed
//! session; `TransactionCoordinator` groups repository calls atomically.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tx;

pub use config::{ConfigError, DbConfig, DbLocation};
pub use db::{ConnectionError, ConnectionProvider, Session, SqliteConnectionProvider};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::attendance::{Attendance, AttendanceDetail, AttendanceId, AttendanceStatus};
pub use model::student::{Student, StudentId};
pub use model::ValidationError;
pub use repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
pub use repo::mapper::MappingError;
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{PersistenceError, RepoError, RepoResult};
pub use service::roster_service::RosterService;
pub use tx::{
    with_transaction, TransactionCoordinator, TransactionStateError, TxError, TxResult, TxState,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
