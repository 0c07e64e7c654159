use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
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

fn base_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gradebookd"));
    cmd.env_remove("GRADEBOOK_WORKSPACE")
        .env_remove("GRADEBOOK_STORE_URL")
        .env_remove("GRADEBOOK_STORE_KEY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    cmd
}

#[test]
fn workspace_env_opens_store_at_startup() {
    let workspace = temp_dir("gradebook-env-workspace");
    let mut child = base_command()
        .env("GRADEBOOK_WORKSPACE", &workspace)
        .spawn()
        .expect("spawn gradebookd");
    let mut stdin = child.stdin.take().expect("stdin");
    let mut reader = BufReader::new(child.stdout.take().expect("stdout"));

    writeln!(
        stdin,
        "{}",
        json!({ "id": "1", "method": "health", "params": {} })
    )
    .expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(value["result"]["store"], "sqlite");
    assert_eq!(
        value["result"]["workspacePath"].as_str(),
        Some(workspace.to_string_lossy().as_ref())
    );
    assert!(workspace.join("gradebook.sqlite3").is_file());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn remote_url_without_key_refuses_to_start() {
    let mut child = base_command()
        .env("GRADEBOOK_STORE_URL", "https://records.example.co")
        .spawn()
        .expect("spawn gradebookd");
    drop(child.stdin.take());
    let status = child.wait().expect("wait");
    assert_eq!(status.code(), Some(2));
}
