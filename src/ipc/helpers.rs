use serde_json::Value;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::RecordStore;

/// Reads a form field as text. Forms may send numbers as JSON numbers or
/// strings; both come out the same. Null and absent are `None`.
pub fn param_text(params: &Value, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn required_id(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    let Some(raw) = param_text(params, key) else {
        return Err(HandlerErr::new("bad_params", format!("missing {key}")));
    };
    optional_id(params, key)?.ok_or_else(|| HandlerErr::new("bad_params", format!("invalid {key}: {raw:?}")))
}

/// Like `required_id`, but an absent or empty value is `Ok(None)`.
pub fn optional_id(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    let Some(raw) = param_text(params, key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<i64>() {
        Ok(v) if v > 0 => Ok(Some(v)),
        _ => Err(HandlerErr::new("bad_params", format!("invalid {key}: {raw:?}"))),
    }
}

/// Runs `f` against the configured store and wraps the outcome as a response.
pub fn with_store<F>(state: &AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&dyn RecordStore, &Value) -> Result<Value, HandlerErr>,
{
    let Some(store) = state.store.as_deref() else {
        return HandlerErr::new(
            "no_store",
            "select a workspace or configure a remote store first",
        )
        .response(&req.id);
    };
    match f(store, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}
