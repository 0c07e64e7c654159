use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown in place of a student or subject that was deleted after grades
/// were recorded against it.
pub const DELETED_PLACEHOLDER: &str = "deleted";

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(StudentId);
record_id!(SubjectId);
record_id!(GradeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Semester {
    #[serde(rename = "1st Semester")]
    First,
    #[serde(rename = "2nd Semester")]
    Second,
    #[serde(rename = "Summer")]
    Summer,
}

impl Semester {
    pub const ALL: [Semester; 3] = [Semester::First, Semester::Second, Semester::Summer];

    pub fn label(self) -> &'static str {
        match self {
            Semester::First => "1st Semester",
            Semester::Second => "2nd Semester",
            Semester::Summer => "Summer",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "PRELIM")]
    Prelim,
    #[serde(rename = "MIDTERM")]
    Midterm,
    #[serde(rename = "SEMI-FINAL")]
    SemiFinal,
    #[serde(rename = "FINAL")]
    Final,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Prelim,
        Period::Midterm,
        Period::SemiFinal,
        Period::Final,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Period::Prelim => "PRELIM",
            Period::Midterm => "MIDTERM",
            Period::SemiFinal => "SEMI-FINAL",
            Period::Final => "FINAL",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub year_level: i64,
    pub course: String,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub units: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored grade. Semester and period are kept as the labels the store
/// holds, so rows written by other clients with labels outside
/// [`Semester::ALL`]/[`Period::ALL`] still list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: GradeId,
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    pub grade: f64,
    pub semester: String,
    pub period: String,
    pub created_at: DateTime<Utc>,
}

/// Student columns pulled into a grade listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub first_name: String,
    pub last_name: String,
}

/// Subject columns pulled into a grade listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    pub subject_code: String,
    pub subject_name: String,
    pub units: i64,
}

/// A grade row joined with whatever is left of its student and subject.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub grade: Grade,
    pub student: Option<StudentRef>,
    pub subject: Option<SubjectRef>,
}

impl GradeRecord {
    pub fn student_name(&self) -> String {
        match &self.student {
            Some(s) => format!("{} {}", s.first_name, s.last_name),
            None => DELETED_PLACEHOLDER.to_string(),
        }
    }

    pub fn subject_label(&self) -> String {
        match &self.subject {
            Some(s) => format!("{} - {}", s.subject_code, s.subject_name),
            None => DELETED_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub year_level: i64,
    pub course: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubject {
    pub subject_code: String,
    pub subject_name: String,
    pub units: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    pub grade: f64,
    pub semester: Semester,
    pub period: Period,
    pub created_at: DateTime<Utc>,
}
