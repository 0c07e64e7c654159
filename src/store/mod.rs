mod rest;
mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

use crate::model::{
    Grade, GradeId, GradeRecord, NewGrade, NewStudent, NewSubject, Student, StudentId, Subject,
    SubjectId,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("request failed: {0}")]
    Http(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudentOrder {
    #[default]
    Id,
    FirstName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubjectOrder {
    #[default]
    Id,
    SubjectCode,
}

/// The three tables the gradebook reads and writes. Implementations own id
/// generation and must refuse a grade whose student or subject is missing.
/// Deletes never cascade.
pub trait RecordStore {
    fn backend(&self) -> &'static str;

    fn list_students(&self, order: StudentOrder) -> Result<Vec<Student>, StoreError>;
    fn get_student(&self, id: StudentId) -> Result<Option<Student>, StoreError>;
    fn insert_student(&self, new: &NewStudent) -> Result<Student, StoreError>;
    fn delete_student(&self, id: StudentId) -> Result<bool, StoreError>;

    fn list_subjects(&self, order: SubjectOrder) -> Result<Vec<Subject>, StoreError>;
    fn insert_subject(&self, new: &NewSubject) -> Result<Subject, StoreError>;
    fn delete_subject(&self, id: SubjectId) -> Result<bool, StoreError>;

    /// Grade rows joined with their student and subject, oldest first.
    fn list_grades(&self, student: Option<StudentId>) -> Result<Vec<GradeRecord>, StoreError>;
    fn insert_grade(&self, new: &NewGrade) -> Result<Grade, StoreError>;
    fn delete_grade(&self, id: GradeId) -> Result<bool, StoreError>;
}
