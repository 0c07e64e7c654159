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
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .env_remove("GRADEBOOK_WORKSPACE")
        .env_remove("GRADEBOOK_STORE_URL")
        .env_remove("GRADEBOOK_STORE_KEY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn create_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    first: &str,
) -> i64 {
    let res = request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({ "firstName": first, "lastName": "Santos", "yearLevel": "3", "course": "BSED" }),
    );
    res["student"]["id"].as_i64().expect("student id")
}

fn add_grade(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student_id: i64,
    subject_id: i64,
    grade: f64,
) -> i64 {
    let res = request_ok(
        stdin,
        reader,
        id,
        "grades.create",
        json!({
            "studentId": student_id,
            "subjectId": subject_id,
            "grade": grade,
            "semester": "2nd Semester",
            "period": "MIDTERM"
        }),
    );
    res["grade"]["id"].as_i64().expect("grade id")
}

#[test]
fn gpa_summary_and_delete_isolation() {
    let workspace = temp_dir("gradebook-student-summary");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let ana = create_student(&mut stdin, &mut reader, "a", "Ana");
    let ben = create_student(&mut stdin, &mut reader, "b", "Ben");
    let subject = request_ok(
        &mut stdin,
        &mut reader,
        "sub",
        "subjects.create",
        json!({ "subjectCode": "eng2", "subjectName": "Writing", "units": 2 }),
    );
    let subject_id = subject["subject"]["id"].as_i64().expect("subject id");

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "e",
        "students.grades",
        json!({ "studentId": ana }),
    );
    assert_eq!(empty["gpa"], "0.00");
    assert_eq!(empty["gradeCount"], 0);

    let g1 = add_grade(&mut stdin, &mut reader, "g1", ana, subject_id, 90.0);
    let _g2 = add_grade(&mut stdin, &mut reader, "g2", ana, subject_id, 80.0);
    let _g3 = add_grade(&mut stdin, &mut reader, "g3", ben, subject_id, 74.99);

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "s1",
        "students.grades",
        json!({ "studentId": ana }),
    );
    assert_eq!(summary["gpa"], "85.00");
    assert_eq!(summary["gpaBand"], "Good");
    assert_eq!(summary["student"]["firstName"], "Ana");
    let rows = summary["grades"].as_array().expect("grades array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["band"], "Excellent");
    assert_eq!(rows[0]["color"], "green");
    assert_eq!(rows[0]["subjectCode"], "ENG2");
    assert_eq!(rows[0]["units"], 2);
    assert_eq!(rows[1]["band"], "Good");

    let ben_before = request_ok(
        &mut stdin,
        &mut reader,
        "b1",
        "students.grades",
        json!({ "studentId": ben }),
    );
    assert_eq!(ben_before["gpa"], "74.99");
    assert_eq!(ben_before["gpaBand"], "Failed");

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "d1",
        "grades.delete",
        json!({ "gradeId": g1 }),
    );
    assert_eq!(deleted["deleted"], true);

    let after = request_ok(
        &mut stdin,
        &mut reader,
        "s2",
        "students.grades",
        json!({ "studentId": ana }),
    );
    assert_eq!(after["gradeCount"], 1);
    assert_eq!(after["gpa"], "80.00");
    assert!(after["grades"]
        .as_array()
        .expect("grades")
        .iter()
        .all(|g| g["id"].as_i64() != Some(g1)));

    let ben_after = request_ok(
        &mut stdin,
        &mut reader,
        "b2",
        "students.grades",
        json!({ "studentId": ben }),
    );
    assert_eq!(ben_after["gpa"], ben_before["gpa"]);
    assert_eq!(ben_after["gradeCount"], 1);

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "d2",
        "grades.delete",
        json!({ "gradeId": g1 }),
    );
    assert_eq!(again["deleted"], false);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn deleted_student_and_subject_render_placeholder() {
    let workspace = temp_dir("gradebook-orphans");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let ana = create_student(&mut stdin, &mut reader, "a", "Ana");
    let subject = request_ok(
        &mut stdin,
        &mut reader,
        "sub",
        "subjects.create",
        json!({ "subjectCode": "PE1", "subjectName": "Fitness", "units": 1 }),
    );
    let subject_id = subject["subject"]["id"].as_i64().expect("subject id");
    let _ = add_grade(&mut stdin, &mut reader, "g", ana, subject_id, 95.0);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ds",
        "subjects.delete",
        json!({ "subjectId": subject_id }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "dst",
        "students.delete",
        json!({ "studentId": ana }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "l", "grades.list", json!({}));
    assert_eq!(listed["total"], 1);
    let row = &listed["grades"][0];
    assert_eq!(row["studentName"], "deleted");
    assert_eq!(row["subjectLabel"], "deleted");
    assert!(row["subjectCode"].is_null());
    assert_eq!(row["band"], "Excellent");

    let gone = request(
        &mut stdin,
        &mut reader,
        "sg",
        "students.grades",
        json!({ "studentId": ana }),
    );
    assert_eq!(error_code(&gone), "not_found");

    drop(stdin);
    let _ = child.wait();
}
