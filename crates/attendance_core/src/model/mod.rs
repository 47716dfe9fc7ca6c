//! Student/attendance domain model.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Validate caller-supplied field values before any store round-trip.
//!
//! # Invariants
//! - Store-assigned ids are `None` until the first insert, then never change.
//! - Attendance has a write shape keyed by `student_id` and a hydrated read
//!   shape carrying the full `Student`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance;
pub mod student;

/// Caller-supplied data violates a field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Student name is empty or whitespace only.
    EmptyName,
    /// Operation needs a persisted entity but the value has no id.
    MissingId(&'static str),
    /// Insert was requested for a value that already carries a store id.
    IdAlreadyAssigned { entity: &'static str, id: i64 },
    /// Attendance references a student id that was never assigned by the store.
    UnsavedStudent(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "student name must not be empty"),
            Self::MissingId(entity) => write!(f, "{entity} has no id; save it first"),
            Self::IdAlreadyAssigned { entity, id } => {
                write!(f, "{entity} already persisted with id {id}")
            }
            Self::UnsavedStudent(id) => write!(
                f,
                "attendance must reference a persisted student, got student id {id}"
            ),
        }
    }
}

impl Error for ValidationError {}
