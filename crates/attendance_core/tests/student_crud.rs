use attendance_core::{
    Attendance, AttendanceRepository, AttendanceStatus, ConnectionProvider, DbConfig,
    PersistenceError, RepoError, Session, SqliteAttendanceRepository, SqliteConnectionProvider,
    SqliteStudentRepository, Student, StudentRepository, ValidationError,
};
use chrono::NaiveDate;

fn open_session() -> Session {
    SqliteConnectionProvider::new(DbConfig::memory())
        .get_session()
        .unwrap()
}

fn student_count(session: &Session) -> i64 {
    session
        .connection()
        .query_row("SELECT COUNT(*) FROM student;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn save_and_find_by_id_roundtrip() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let input = Student::new("Ali Hasan", "G1");
    let saved = repo.save(&input).unwrap();
    let id = saved.id.expect("save assigns an id");
    assert!(id > 0);
    assert_eq!(saved.name, input.name);
    assert_eq!(saved.class_group, input.class_group);
    assert_eq!(saved.created_at, None);
    assert_eq!(input.id, None, "input value is left untouched");

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.id, Some(id));
    assert_eq!(loaded.name, "Ali Hasan");
    assert_eq!(loaded.class_group, "G1");
    assert!(loaded.created_at.is_some(), "store fills create_date");
    assert!(loaded.is_same_entity(&saved));
}

#[test]
fn generated_ids_are_distinct() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let first = repo.save(&Student::new("A", "G1")).unwrap();
    let second = repo.save(&Student::new("B", "G1")).unwrap();
    assert_ne!(first.id, second.id);
}

#[test]
fn save_rejects_empty_name_before_touching_store() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let err = repo.save(&Student::new("  ", "G1")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyName)));
    assert_eq!(student_count(&session), 0);
}

#[test]
fn save_rejects_already_persisted_student() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let saved = repo.save(&Student::new("A", "G1")).unwrap();
    let err = repo.save(&saved).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::IdAlreadyAssigned { entity: "student", .. })
    ));
    assert_eq!(student_count(&session), 1);
}

#[test]
fn find_by_id_missing_returns_none() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    assert!(repo.find_by_id(42).unwrap().is_none());
}

#[test]
fn find_all_returns_every_row_in_id_order() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    assert!(repo.find_all().unwrap().is_empty());
    let c = repo.save(&Student::new("C", "G2")).unwrap();
    let a = repo.save(&Student::new("A", "G1")).unwrap();
    let b = repo.save(&Student::new("B", "G1")).unwrap();

    let ids: Vec<_> = repo.find_all().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![c.id, a.id, b.id]);
}

#[test]
fn update_replaces_name_and_group_but_keeps_create_date() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let saved = repo.save(&Student::new("Draft", "G1")).unwrap();
    let before = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();

    let mut changed = before.clone();
    changed.name = "Final".to_string();
    changed.class_group = "G2".to_string();
    repo.update(&changed).unwrap();

    let after = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(after.name, "Final");
    assert_eq!(after.class_group, "G2");
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn update_of_missing_id_is_persistence_error() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let ghost = Student::new("Ghost", "G1").with_id(999);
    let err = repo.update(&ghost).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Persistence(PersistenceError::NoRowsAffected {
            table: "student",
            operation: "update",
            id: Some(999),
        })
    ));
}

#[test]
fn update_requires_id_and_valid_name() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let err = repo.update(&Student::new("Unsaved", "G1")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingId("student"))
    ));

    let saved = repo.save(&Student::new("Named", "G1")).unwrap();
    let mut blank = saved.clone();
    blank.name = String::new();
    let err = repo.update(&blank).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyName)));
    assert_eq!(
        repo.find_by_id(saved.id.unwrap()).unwrap().unwrap().name,
        "Named"
    );
}

#[test]
fn delete_twice_reports_removal_then_absence() {
    let session = open_session();
    let repo = SqliteStudentRepository::try_new(&session).unwrap();

    let id = repo.save(&Student::new("A", "G1")).unwrap().id.unwrap();
    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
    assert!(repo.find_by_id(id).unwrap().is_none());
}

#[test]
fn delete_of_referenced_student_is_rejected_by_store() {
    let session = open_session();
    let students = SqliteStudentRepository::try_new(&session).unwrap();
    let marks = SqliteAttendanceRepository::try_new(&session).unwrap();

    let student = students.save(&Student::new("A", "G1")).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    marks
        .save(&Attendance::for_student(&student, date, AttendanceStatus::Present).unwrap())
        .unwrap();

    let err = students.delete(student.id.unwrap()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Persistence(PersistenceError::ConstraintViolation(_))
    ));
    assert!(students.find_by_id(student.id.unwrap()).unwrap().is_some());
}
