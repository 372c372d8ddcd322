use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "battlestat-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn write_input(label: &str, json: &str) -> std::path::PathBuf {
    let path = temp_path(label).with_extension("json");
    std::fs::write(&path, json).expect("write input");
    path
}

const SNAPSHOT: &str = r#"{
    "name": "CliUser",
    "level": 35,
    "rank": "Average",
    "captured_at": 1704067200,
    "age_days": 900,
    "donator_days": 600,
    "activity_time": 25920000,
    "energy_refills": 250,
    "stat_enhancers": 3
}"#;

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_battlestat");
    let input = write_input("snapshot", SNAPSHOT);
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .arg(&input)
        .args(["--report", "json", "--rank-correction", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let prediction = &value["predictions"][0];
    assert_eq!(prediction["name"], "CliUser");
    assert!(prediction["energy"]["total"].as_f64().unwrap() > 0.0);
    assert!(prediction["rank_correction"].is_object());
    assert!(prediction["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn cli_reads_payload_documents() {
    let exe = env!("CARGO_BIN_EXE_battlestat");
    let input = write_input(
        "payload",
        r#"{ "profile": { "name": "Nested", "age": 400 },
             "personalstats": { "other": { "activity": { "time": 8640000 } } } }"#,
    );
    let output = Command::new(exe)
        .arg(&input)
        .args([
            "--input-format",
            "payload",
            "--captured-at",
            "1704067200",
            "--report",
            "markdown",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Battle Stat Estimates"));
    assert!(stdout.contains("| Nested |"));
}

#[test]
fn cli_rejects_malformed_input() {
    let exe = env!("CARGO_BIN_EXE_battlestat");
    let input = write_input("broken", "{ not json");
    let output = Command::new(exe).arg(&input).output().expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to estimate"));
}

#[test]
fn cli_rejects_invalid_model() {
    let exe = env!("CARGO_BIN_EXE_battlestat");
    let input = write_input("model-input", SNAPSHOT);
    let model = write_input("model", r#"{ "gyms": [] }"#);
    let output = Command::new(exe)
        .arg(&input)
        .arg("--model")
        .arg(&model)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load model"));
}
