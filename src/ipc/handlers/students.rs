use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{
    optional_positive, require_store, required_int, required_str, required_student_id, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::Scores;
use serde_json::json;

fn scores_param(req: &Request) -> Result<Scores, HandlerErr> {
    Ok(Scores::new(
        required_int(req, "kor")?,
        required_int(req, "eng")?,
        required_int(req, "mat")?,
    ))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let scores = match scores_param(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match store.create(&name, scores) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let default_size = state.page_size;
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let page = match optional_positive(req, "page", 1) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let page_size = match optional_positive(req, "pageSize", default_size) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match store.list(page, page_size) {
        Ok(page) => ok(&req.id, json!(page)),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let student_id = match required_student_id(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match store.get_by_student_id(&student_id) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let student_id = match required_student_id(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let scores = match scores_param(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match store.update(&student_id, &name, scores) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let student_id = match required_student_id(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match store.delete(&student_id) {
        Ok(name) => ok(&req.id, json!({ "studentId": student_id, "name": name })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(handle_students_create(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
