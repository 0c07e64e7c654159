use serde::Serialize;

use crate::model::{GradeRecord, Student};
use crate::validate::round_2_decimals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeBand {
    Excellent,
    Good,
    Passing,
    Failed,
}

impl GradeBand {
    /// Lower bounds are inclusive: exactly 90 is Excellent, exactly 75 is Passing.
    pub fn classify(value: f64) -> Self {
        if value >= 90.0 {
            GradeBand::Excellent
        } else if value >= 80.0 {
            GradeBand::Good
        } else if value >= 75.0 {
            GradeBand::Passing
        } else {
            GradeBand::Failed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradeBand::Excellent => "Excellent",
            GradeBand::Good => "Good",
            GradeBand::Passing => "Passing",
            GradeBand::Failed => "Failed",
        }
    }

    /// Color key the UI uses for badges; tied to the band, never to raw thresholds.
    pub fn color(self) -> &'static str {
        match self {
            GradeBand::Excellent => "green",
            GradeBand::Good => "blue",
            GradeBand::Passing => "yellow",
            GradeBand::Failed => "red",
        }
    }
}

pub fn mean_grade<I>(grades: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut count: usize = 0;
    let mut sum: f64 = 0.0;
    for g in grades {
        count += 1;
        sum += g;
    }
    if count > 0 {
        Some(sum / (count as f64))
    } else {
        None
    }
}

/// Unweighted mean of every grade row, two decimals. No rows gives "0.00".
pub fn compute_gpa<I>(grades: I) -> String
where
    I: IntoIterator<Item = f64>,
{
    format!("{:.2}", mean_grade(grades).unwrap_or(0.0))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRow {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub student_name: String,
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub subject_label: String,
    pub units: Option<i64>,
    pub grade: f64,
    pub semester: String,
    pub period: String,
    pub band: &'static str,
    pub color: &'static str,
    pub created_at: String,
}

impl From<&GradeRecord> for GradeRow {
    fn from(rec: &GradeRecord) -> Self {
        let band = GradeBand::classify(rec.grade.grade);
        GradeRow {
            id: rec.grade.id.get(),
            student_id: rec.grade.student_id.get(),
            subject_id: rec.grade.subject_id.get(),
            student_name: rec.student_name(),
            subject_code: rec.subject.as_ref().map(|s| s.subject_code.clone()),
            subject_name: rec.subject.as_ref().map(|s| s.subject_name.clone()),
            subject_label: rec.subject_label(),
            units: rec.subject.as_ref().map(|s| s.units),
            grade: rec.grade.grade,
            semester: rec.grade.semester.clone(),
            period: rec.grade.period.clone(),
            band: band.label(),
            color: band.color(),
            created_at: rec.grade.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student: Student,
    pub grades: Vec<GradeRow>,
    pub grade_count: usize,
    pub gpa: String,
    pub gpa_band: Option<&'static str>,
}

/// Builds the per-student view. `records` must already be limited to `student`.
pub fn student_summary(student: Student, records: &[GradeRecord]) -> StudentSummary {
    let mean = mean_grade(records.iter().map(|r| r.grade.grade));
    StudentSummary {
        grades: records.iter().map(GradeRow::from).collect(),
        grade_count: records.len(),
        gpa: compute_gpa(records.iter().map(|r| r.grade.grade)),
        // Band the figure that is displayed, not the raw mean.
        gpa_band: mean.map(|m| GradeBand::classify(round_2_decimals(m)).label()),
        student,
    }
}
