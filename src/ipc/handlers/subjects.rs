use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{param_text, required_id, with_store};
use crate::ipc::types::{AppState, Request};
use crate::model::SubjectId;
use crate::store::{RecordStore, SubjectOrder};
use crate::validate::{validate_subject_submission, SubjectSubmission};
use serde_json::{json, Value};

fn parse_order(params: &Value) -> Result<SubjectOrder, HandlerErr> {
    match param_text(params, "orderBy").as_deref() {
        None | Some("") | Some("id") => Ok(SubjectOrder::Id),
        Some("subjectCode") => Ok(SubjectOrder::SubjectCode),
        Some(other) => Err(HandlerErr::new(
            "bad_params",
            format!("unsupported orderBy: {other}"),
        )),
    }
}

fn subjects_list(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let subjects = store.list_subjects(parse_order(params)?)?;
    Ok(json!({ "total": subjects.len(), "subjects": subjects }))
}

fn subjects_create(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let input = SubjectSubmission {
        subject_code: param_text(params, "subjectCode"),
        subject_name: param_text(params, "subjectName"),
        units: param_text(params, "units"),
        description: param_text(params, "description"),
    };
    let new = validate_subject_submission(&input)?;
    let subject = store.insert_subject(&new)?;
    tracing::info!(subject_id = %subject.id, code = %subject.subject_code, "subject added");
    Ok(json!({ "subject": subject }))
}

fn subjects_delete(store: &dyn RecordStore, params: &Value) -> Result<Value, HandlerErr> {
    let id = SubjectId(required_id(params, "subjectId")?);
    let deleted = store.delete_subject(id)?;
    Ok(json!({ "subjectId": id, "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(with_store(state, req, subjects_list)),
        "subjects.create" => Some(with_store(state, req, subjects_create)),
        "subjects.delete" => Some(with_store(state, req, subjects_delete)),
        _ => None,
    }
}
