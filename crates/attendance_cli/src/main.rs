//! Command-line harness over `attendance_core`.
//!
//! # Responsibility
//! - Open a session on the configured database and run one repository or
//!   transaction flow per invocation.
//! - Print results as JSON lines on stdout; logs go to stderr or a log dir.

use anyhow::{Context, Result};
use attendance_core::{
    default_log_level, init_logging, AttendanceRepository, AttendanceStatus, DbConfig,
    LoggingConfig, RosterService, SqliteAttendanceRepository, SqliteConnectionProvider,
    SqliteStudentRepository, Student, StudentId, StudentRepository, TxError,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

const DEFAULT_DB_FILE_NAME: &str = "attendance.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "attendance", version, about = "Student attendance records over SQLite")]
struct Cli {
    /// Database file. Falls back to ATTENDANCE_DB_PATH, then ./attendance.sqlite3.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all students.
    Students,
    /// Add one student.
    AddStudent { name: String, class_group: String },
    /// List attendance records with their students.
    Records {
        /// Only records of this student.
        #[arg(long)]
        student: Option<StudentId>,
    },
    /// Record attendance for an existing student.
    Mark {
        student_id: StudentId,
        status: StatusArg,
        /// Defaults to today (local time).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Enrol a student and mark them present in one transaction.
    Demo {
        /// Reference a student id that does not exist so the unit rolls back.
        #[arg(long)]
        break_foreign_key: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Present,
    Absent,
}

impl From<StatusArg> for AttendanceStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Present => AttendanceStatus::Present,
            StatusArg::Absent => AttendanceStatus::Absent,
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("attendance error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let logging = match cli.log_dir.clone() {
        Some(dir) => LoggingConfig::in_dir(level, dir),
        None => LoggingConfig::stderr(level),
    };
    init_logging(&logging).map_err(anyhow::Error::msg)?;
    info!(
        "event=cli_start module=cli status=ok core_version={}",
        attendance_core::core_version()
    );

    let config = resolve_db_config(cli.db.clone())?;
    let service = RosterService::new(SqliteConnectionProvider::new(config));

    match cli.command {
        Command::Students => {
            let session = service.session()?;
            let repo = SqliteStudentRepository::try_new(&session)?;
            for student in repo.find_all()? {
                print_json(&student)?;
            }
        }
        Command::AddStudent { name, class_group } => {
            let session = service.session()?;
            let repo = SqliteStudentRepository::try_new(&session)?;
            let saved = repo.save(&Student::new(name, class_group))?;
            print_json(&saved)?;
        }
        Command::Records { student } => {
            let session = service.session()?;
            let repo = SqliteAttendanceRepository::try_new(&session)?;
            let records = match student {
                Some(student_id) => repo.find_by_student(student_id)?,
                None => repo.find_all()?,
            };
            for record in records {
                print_json(&record)?;
            }
        }
        Command::Mark {
            student_id,
            status,
            date,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let detail = service.record_attendance(student_id, date, status.into())?;
            print_json(&detail)?;
        }
        Command::Demo { break_foreign_key } => run_demo(&service, break_foreign_key)?,
    }

    Ok(())
}

fn resolve_db_config(cli_path: Option<PathBuf>) -> Result<DbConfig> {
    if let Some(path) = cli_path {
        return Ok(DbConfig::file(path));
    }
    let from_env = DbConfig::from_env().context("invalid database environment settings")?;
    Ok(from_env.unwrap_or_else(|| DbConfig::file(DEFAULT_DB_FILE_NAME)))
}

fn run_demo(service: &RosterService<SqliteConnectionProvider>, break_foreign_key: bool) -> Result<()> {
    let dangling_id = break_foreign_key.then_some(10_000);
    let outcome = service.enroll_with_attendance(
        &Student::new("Transaction Student", "G1"),
        Local::now().date_naive(),
        AttendanceStatus::Present,
        dangling_id,
    );

    match outcome {
        Ok(detail) => print_json(&detail),
        Err(err @ TxError::Aborted(_)) => {
            println!("{}", serde_json::json!({ "rolled_back": true, "error": err.to_string() }));
            Ok(())
        }
        Err(err) => Err(err).context("transaction demo failed"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
