//! Checks applied to form submissions before anything is written.
//!
//! Every input arrives as raw text exactly as the form produced it. Each
//! validator either returns a normalized record ready for the store or the
//! first problem it found; none of them touch the store or the clock.

use chrono::{DateTime, Utc};

use crate::model::{NewGrade, NewStudent, NewSubject, Period, Semester, StudentId, SubjectId};

pub const GRADE_MIN: f64 = 0.0;
pub const GRADE_MAX: f64 = 100.0;
pub const UNITS_RANGE: (i64, i64) = (1, 10);
pub const YEAR_LEVEL_RANGE: (i64, i64) = (1, 5);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} is not a valid identifier: {value:?}")]
    InvalidReference { field: &'static str, value: String },
    #[error("{field} must be {expected}, got {value:?}")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::InvalidReference { .. } => "invalid_reference",
            ValidationError::OutOfRange { .. } => "out_of_range",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidReference { field, .. }
            | ValidationError::OutOfRange { field, .. } => *field,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GradeSubmission {
    pub student_id: Option<String>,
    pub subject_id: Option<String>,
    pub grade: Option<String>,
    pub semester: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectSubmission {
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub units: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub year_level: Option<String>,
    pub course: Option<String>,
}

fn required<'a>(field: &'static str, raw: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match raw.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField { field }),
    }
}

fn parse_id(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    match raw.parse::<i64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ValidationError::InvalidReference {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_int_in(
    field: &'static str,
    raw: &str,
    (lo, hi): (i64, i64),
    expected: &'static str,
) -> Result<i64, ValidationError> {
    match raw.parse::<i64>() {
        Ok(v) if (lo..=hi).contains(&v) => Ok(v),
        _ => Err(ValidationError::OutOfRange {
            field,
            value: raw.to_string(),
            expected,
        }),
    }
}

/// Rounds to two decimal places, the precision grades are stored with.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn validate_grade_submission(
    input: &GradeSubmission,
    now: DateTime<Utc>,
) -> Result<NewGrade, ValidationError> {
    let student_raw = required("studentId", &input.student_id)?;
    let subject_raw = required("subjectId", &input.subject_id)?;
    let grade_raw = required("grade", &input.grade)?;
    let semester_raw = required("semester", &input.semester)?;
    let period_raw = required("period", &input.period)?;

    let student_id = StudentId(parse_id("studentId", student_raw)?);
    let subject_id = SubjectId(parse_id("subjectId", subject_raw)?);

    let grade = match grade_raw.parse::<f64>() {
        Ok(v) if v.is_finite() && (GRADE_MIN..=GRADE_MAX).contains(&v) => round_2_decimals(v),
        _ => {
            return Err(ValidationError::OutOfRange {
                field: "grade",
                value: grade_raw.to_string(),
                expected: "a number between 0 and 100",
            })
        }
    };

    let semester = Semester::from_label(semester_raw).ok_or_else(|| ValidationError::OutOfRange {
        field: "semester",
        value: semester_raw.to_string(),
        expected: "one of 1st Semester, 2nd Semester, Summer",
    })?;
    let period = Period::from_label(period_raw).ok_or_else(|| ValidationError::OutOfRange {
        field: "period",
        value: period_raw.to_string(),
        expected: "one of PRELIM, MIDTERM, SEMI-FINAL, FINAL",
    })?;

    Ok(NewGrade {
        student_id,
        subject_id,
        grade,
        semester,
        period,
        created_at: now,
    })
}

pub fn validate_subject_submission(input: &SubjectSubmission) -> Result<NewSubject, ValidationError> {
    let code = required("subjectCode", &input.subject_code)?;
    let name = required("subjectName", &input.subject_name)?;
    let units_raw = required("units", &input.units)?;

    let units = parse_int_in("units", units_raw, UNITS_RANGE, "a whole number from 1 to 10")?;

    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(NewSubject {
        subject_code: code.to_uppercase(),
        subject_name: name.to_string(),
        units,
        description,
    })
}

pub fn validate_student_submission(input: &StudentSubmission) -> Result<NewStudent, ValidationError> {
    let first_name = required("firstName", &input.first_name)?;
    let last_name = required("lastName", &input.last_name)?;
    let year_raw = required("yearLevel", &input.year_level)?;
    let course = required("course", &input.course)?;

    let year_level = parse_int_in(
        "yearLevel",
        year_raw,
        YEAR_LEVEL_RANGE,
        "a whole number from 1 to 5",
    )?;

    Ok(NewStudent {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        year_level,
        course: course.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn grade_input(grade: &str) -> GradeSubmission {
        GradeSubmission {
            student_id: s("12"),
            subject_id: s("4"),
            grade: s(grade),
            semester: s("1st Semester"),
            period: s("MIDTERM"),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn grade_accepts_whole_closed_range() {
        for g in ["0", "0.00", "50", "74.99", "99.999", "100", "100.00"] {
            let out = validate_grade_submission(&grade_input(g), fixed_now())
                .unwrap_or_else(|e| panic!("{g} rejected: {e}"));
            assert!((0.0..=100.0).contains(&out.grade));
        }
    }

    #[test]
    fn grade_outside_range_is_out_of_range() {
        for g in ["-0.01", "-5", "100.01", "250", "abc", "NaN", "inf"] {
            let e = validate_grade_submission(&grade_input(g), fixed_now()).unwrap_err();
            assert_eq!(e.code(), "out_of_range", "{g}");
            assert_eq!(e.field(), "grade");
        }
    }

    #[test]
    fn grade_is_normalized() {
        let out = validate_grade_submission(&grade_input(" 87.456 "), fixed_now()).unwrap();
        assert_eq!(out.grade, 87.46);
        assert_eq!(out.student_id, StudentId(12));
        assert_eq!(out.subject_id, SubjectId(4));
        assert_eq!(out.semester, Semester::First);
        assert_eq!(out.period, Period::Midterm);
        assert_eq!(out.created_at, fixed_now());
    }

    #[test]
    fn empty_semester_is_missing_even_when_rest_is_valid() {
        let mut input = grade_input("90");
        input.semester = s("");
        assert_eq!(
            validate_grade_submission(&input, fixed_now()),
            Err(ValidationError::MissingField { field: "semester" })
        );
        input.semester = None;
        assert_eq!(
            validate_grade_submission(&input, fixed_now()),
            Err(ValidationError::MissingField { field: "semester" })
        );
    }

    #[test]
    fn missing_fields_reported_before_parse_errors() {
        let input = GradeSubmission {
            student_id: s("not-an-id"),
            subject_id: s("   "),
            grade: s("500"),
            ..Default::default()
        };
        let e = validate_grade_submission(&input, fixed_now()).unwrap_err();
        assert_eq!(e, ValidationError::MissingField { field: "subjectId" });
    }

    #[test]
    fn malformed_ids_are_invalid_references() {
        for bad in ["abc", "0", "-3", "1.5"] {
            let mut input = grade_input("80");
            input.subject_id = s(bad);
            let e = validate_grade_submission(&input, fixed_now()).unwrap_err();
            assert_eq!(e.code(), "invalid_reference", "{bad}");
            assert_eq!(e.field(), "subjectId");
        }
    }

    #[test]
    fn unknown_period_is_rejected() {
        let mut input = grade_input("80");
        input.period = s("QUARTER");
        let e = validate_grade_submission(&input, fixed_now()).unwrap_err();
        assert_eq!(e.code(), "out_of_range");
        assert_eq!(e.field(), "period");
    }

    #[test]
    fn subject_code_is_uppercased() {
        let out = validate_subject_submission(&SubjectSubmission {
            subject_code: s("cs101"),
            subject_name: s("Intro to Computing"),
            units: s("3"),
            description: None,
        })
        .unwrap();
        assert_eq!(out.subject_code, "CS101");
        assert_eq!(out.units, 3);
        assert_eq!(out.description, None);
    }

    #[test]
    fn subject_blank_description_becomes_none() {
        let out = validate_subject_submission(&SubjectSubmission {
            subject_code: s("ge1"),
            subject_name: s("Ethics"),
            units: s("2"),
            description: s("  "),
        })
        .unwrap();
        assert_eq!(out.description, None);
    }

    #[test]
    fn subject_units_band() {
        for (units, ok) in [("1", true), ("10", true), ("0", false), ("11", false), ("x", false)] {
            let r = validate_subject_submission(&SubjectSubmission {
                subject_code: s("MATH1"),
                subject_name: s("Algebra"),
                units: s(units),
                description: s("core"),
            });
            assert_eq!(r.is_ok(), ok, "units {units}");
        }
        let e = validate_subject_submission(&SubjectSubmission {
            subject_code: s("MATH1"),
            subject_name: s(""),
            units: s("3"),
            description: None,
        })
        .unwrap_err();
        assert_eq!(e, ValidationError::MissingField { field: "subjectName" });
    }

    #[test]
    fn student_year_level_must_be_numeric() {
        let mut input = StudentSubmission {
            first_name: s("Ana"),
            last_name: s("Cruz"),
            year_level: s("2"),
            course: s("BSIT"),
        };
        assert_eq!(validate_student_submission(&input).unwrap().year_level, 2);

        input.year_level = s("second");
        let e = validate_student_submission(&input).unwrap_err();
        assert_eq!(e.code(), "out_of_range");
        assert_eq!(e.field(), "yearLevel");

        input.year_level = s("6");
        assert!(validate_student_submission(&input).is_err());
    }
}
