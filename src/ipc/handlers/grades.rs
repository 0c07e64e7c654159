use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{optional_id, param_text, required_id, with_store};
use crate::ipc::types::{AppState, Request};
use crate::model::{GradeId, Period, Semester, StudentId};
use crate::store::{RecordStore, StudentOrder, SubjectOrder};
use crate::summary::GradeRow;
use crate::validate::{validate_grade_submission, GradeSubmission};
use chrono::Utc;
use serde_json::{json, Value};

fn grades_list(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let student = optional_id(params, "studentId")?.map(StudentId);
    let records = store.list_grades(student)?;
    let rows: Vec<GradeRow> = records.iter().map(GradeRow::from).collect();
    Ok(json!({ "total": rows.len(), "grades": rows }))
}

fn grades_create(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let input = GradeSubmission {
        student_id: param_text(params, "studentId"),
        subject_id: param_text(params, "subjectId"),
        grade: param_text(params, "grade"),
        semester: param_text(params, "semester"),
        period: param_text(params, "period"),
    };
    let new = validate_grade_submission(&input, Utc::now())?;
    let grade = store.insert_grade(&new)?;
    tracing::info!(grade_id = %grade.id, student_id = %grade.student_id, "grade recorded");
    Ok(json!({ "grade": grade }))
}

fn grades_delete(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let id = GradeId(required_id(params, "gradeId")?);
    let deleted = store.delete_grade(id)?;
    Ok(json!({ "gradeId": id, "deleted": deleted }))
}

/// Everything the add-grade form needs to populate its pickers.
fn grades_options(store: &dyn RecordStore, _params: &Value) -> Result<Value, HandlerErr> {
    let students: Vec<Value> = store
        .list_students(StudentOrder::FirstName)?
        .iter()
        .map(|s| json!({ "id": s.id, "name": s.display_name() }))
        .collect();
    let subjects: Vec<Value> = store
        .list_subjects(SubjectOrder::SubjectCode)?
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "label": format!("{} - {}", s.subject_code, s.subject_name),
            })
        })
        .collect();
    Ok(json!({
        "students": students,
        "subjects": subjects,
        "semesters": Semester::ALL.map(Semester::label),
        "periods": Period::ALL.map(Period::label),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(with_store(state, req, grades_list)),
        "grades.create" => Some(with_store(state, req, grades_create)),
        "grades.delete" => Some(with_store(state, req, grades_delete)),
        "grades.options" => Some(with_store(state, req, grades_options)),
        _ => None,
    }
}
