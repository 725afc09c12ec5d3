use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_sungjukd");
    let mut child = Command::new(exe)
        .env_remove("SUNGJUKD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn sungjukd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("sungjuk-router-smoke");
    let snapshot_out = workspace.join("smoke-snapshot.db");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health
            .get("result")
            .and_then(|r| r.get("version"))
            .and_then(|v| v.as_str()),
        Some(env!("CARGO_PKG_VERSION"))
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "name": "Smoke", "kor": 1, "eng": 2, "mat": 3 }),
    );
    let student_id = created
        .get("result")
        .and_then(|v| v.get("student"))
        .and_then(|v| v.get("studentId"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let _ = request(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.get",
        json!({ "studentId": student_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "studentId": student_id, "name": "Smoke", "kor": 4, "eng": 5, "mat": 6 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "backup.snapshot",
        json!({ "outPath": snapshot_out.to_string_lossy() }),
    );
    let restored = request(
        &mut stdin,
        &mut reader,
        "8",
        "backup.restore",
        json!({ "inPath": snapshot_out.to_string_lossy() }),
    );
    assert_eq!(restored.get("ok").and_then(|v| v.as_bool()), Some(true));
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "students.delete",
        json!({ "studentId": student_id }),
    );

    let unknown = {
        writeln!(
            stdin,
            "{}",
            json!({ "id": "10", "method": "students.search", "params": {} })
        )
        .expect("write request");
        stdin.flush().expect("flush request");
        read_response(&mut reader)
    };
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_line_gets_bad_json_and_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let resp = read_response(&mut reader);
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_json")
    );

    // Blank lines are skipped without a reply.
    writeln!(stdin).expect("write blank");
    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));

    drop(stdin);
    let _ = child.wait();
}

fn result_str<'a>(value: &'a serde_json::Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = value.get("result")?;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str()
}

#[test]
fn restore_into_other_workspace_keeps_active_selection() {
    let active = temp_dir("sungjuk-restore-active");
    let other = temp_dir("sungjuk-restore-other");
    let snapshot_out = active.join("active-snapshot.db");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": active.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "Active", "kor": 80, "eng": 80, "mat": 80 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "backup.snapshot",
        json!({ "outPath": snapshot_out.to_string_lossy() }),
    );

    let restored = request(
        &mut stdin,
        &mut reader,
        "4",
        "backup.restore",
        json!({
            "inPath": snapshot_out.to_string_lossy(),
            "workspacePath": other.to_string_lossy()
        }),
    );
    assert_eq!(restored.get("ok").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        restored
            .get("result")
            .and_then(|r| r.get("selected"))
            .and_then(|v| v.as_bool()),
        Some(false)
    );
    assert!(other.join("students.db").is_file());

    let health = request(&mut stdin, &mut reader, "5", "health", json!({}));
    assert_eq!(
        result_str(&health, &["workspacePath"]).map(PathBuf::from),
        Some(active.clone())
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(active);
    let _ = std::fs::remove_dir_all(other);
}

#[test]
fn restore_of_non_database_file_is_rejected_and_records_survive() {
    let workspace = temp_dir("sungjuk-restore-junk");
    let junk = workspace.join("grades.csv");
    std::fs::write(&junk, "name,kor,eng,mat\nKim,90,90,90\n").expect("write junk");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "Kept", "kor": 70, "eng": 70, "mat": 70 }),
    );
    let student_id = result_str(&created, &["student", "studentId"])
        .unwrap_or("")
        .to_string();

    let rejected = request(
        &mut stdin,
        &mut reader,
        "3",
        "backup.restore",
        json!({ "inPath": junk.to_string_lossy() }),
    );
    assert_eq!(rejected.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        rejected
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("restore_rejected")
    );

    let fetched = request(
        &mut stdin,
        &mut reader,
        "4",
        "students.get",
        json!({ "studentId": student_id }),
    );
    assert_eq!(result_str(&fetched, &["student", "name"]), Some("Kept"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
