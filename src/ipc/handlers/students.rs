use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{param_text, required_id, with_store};
use crate::ipc::types::{AppState, Request};
use crate::model::StudentId;
use crate::store::{RecordStore, StudentOrder};
use crate::summary::student_summary;
use crate::validate::{validate_student_submission, StudentSubmission};
use serde_json::{json, Value};

fn parse_order(params: &Value) -> Result<StudentOrder, HandlerErr> {
    match param_text(params, "orderBy").as_deref() {
        None | Some("") | Some("id") => Ok(StudentOrder::Id),
        Some("firstName") => Ok(StudentOrder::FirstName),
        Some(other) => Err(HandlerErr::new(
            "bad_params",
            format!("unsupported orderBy: {other}"),
        )),
    }
}

fn students_list(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let students = store.list_students(parse_order(params)?)?;
    Ok(json!({ "total": students.len(), "students": students }))
}

fn students_create(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let input = StudentSubmission {
        first_name: param_text(params, "firstName"),
        last_name: param_text(params, "lastName"),
        year_level: param_text(params, "yearLevel"),
        course: param_text(params, "course"),
    };
    let new = validate_student_submission(&input)?;
    let student = store.insert_student(&new)?;
    tracing::info!(student_id = %student.id, "student registered");
    Ok(json!({ "student": student }))
}

fn students_delete(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let id = StudentId(required_id(params, "studentId")?);
    let deleted = store.delete_student(id)?;
    Ok(json!({ "studentId": id, "deleted": deleted }))
}

fn students_grades(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let id = StudentId(required_id(params, "studentId")?);
    let Some(student) = store.get_student(id)? else {
        return Err(HandlerErr::new("not_found", format!("student {id} not found")));
    };
    let records = store.list_grades(Some(id))?;
    let summary = student_summary(student, &records);
    serde_json::to_value(summary).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(with_store(state, req, students_list)),
        "students.create" => Some(with_store(state, req, students_create)),
        "students.delete" => Some(with_store(state, req, students_delete)),
        "students.grades" => Some(with_store(state, req, students_grades)),
        _ => None,
    }
}
