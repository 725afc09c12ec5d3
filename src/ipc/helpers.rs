use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::RecordStore;

/// A rejected request, rendered with [`HandlerErr::response`].
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn require_store(state: &AppState) -> Result<&RecordStore, HandlerErr> {
    state.store.as_ref().ok_or_else(|| HandlerErr {
        code: "no_workspace",
        message: "select a workspace first".to_string(),
        details: None,
    })
}

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) => Ok(v.to_string()),
        None => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Student ids are compared exactly, so only surrounding whitespace is dropped.
pub fn required_student_id(req: &Request) -> Result<String, HandlerErr> {
    let v = required_str(req, "studentId")?;
    let v = v.trim().to_string();
    if v.is_empty() {
        return Err(HandlerErr::bad_params("studentId must not be empty"));
    }
    Ok(v)
}

/// Integer param; form-style numeric strings ("85") are accepted too.
pub fn required_int(req: &Request, key: &str) -> Result<i64, HandlerErr> {
    let Some(v) = req.params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    let parsed = match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer", key)))
}

/// Positive integer param with a fallback when absent or null.
pub fn optional_positive(req: &Request, key: &str, default: u32) -> Result<u32, HandlerErr> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(_) => {
            let v = required_int(req, key)?;
            match u32::try_from(v) {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(HandlerErr::bad_params(format!(
                    "{} must be a positive integer",
                    key
                ))),
            }
        }
    }
}
