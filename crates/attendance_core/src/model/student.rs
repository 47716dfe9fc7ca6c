//! Student entity.

use super::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Store-assigned student identifier.
pub type StudentId = i64;

/// One row of the `student` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// `None` until the first insert assigns it.
    pub id: Option<StudentId>,
    pub name: String,
    pub class_group: String,
    /// Filled by the store's `create_date` default; only present on reads.
    pub created_at: Option<NaiveDateTime>,
}

impl Student {
    /// Creates an unsaved student.
    pub fn new(name: impl Into<String>, class_group: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            class_group: class_group.into(),
            created_at: None,
        }
    }

    /// Checks field constraints shared by insert and update paths.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Returns the store id, or `MissingId` when this value was never saved.
    pub fn require_id(&self) -> Result<StudentId, ValidationError> {
        self.id.ok_or(ValidationError::MissingId("student"))
    }

    /// Returns a copy carrying the generated id.
    pub fn with_id(&self, id: StudentId) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Whether both values denote the same persisted row.
    ///
    /// Unsaved values are never the same entity, not even as themselves.
    pub fn is_same_entity(&self, other: &Student) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::Student;
    use crate::model::ValidationError;

    #[test]
    fn new_student_is_unsaved() {
        let student = Student::new("Ali Hasan", "G1");
        assert_eq!(student.id, None);
        assert_eq!(student.created_at, None);
        assert_eq!(
            student.require_id(),
            Err(ValidationError::MissingId("student"))
        );
    }

    #[test]
    fn validate_rejects_blank_name() {
        assert_eq!(
            Student::new("   ", "G1").validate(),
            Err(ValidationError::EmptyName)
        );
        assert!(Student::new("Sara", "").validate().is_ok());
    }

    #[test]
    fn identity_follows_assigned_id() {
        let first = Student::new("A", "G1").with_id(7);
        let mut renamed = first.clone();
        renamed.name = "B".to_string();
        assert!(first.is_same_entity(&renamed));

        let unsaved = Student::new("A", "G1");
        assert!(!unsaved.is_same_entity(&unsaved));
        assert!(!first.is_same_entity(&Student::new("A", "G1").with_id(8)));
    }
}
