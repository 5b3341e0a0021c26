// integration tests for the check command

use crate::common::*;
use lifecourse::cli::exit_codes;

#[test]
fn test_check_valid_library_text() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());

    let output = run_lifecourse(&["--no-json", "check", defs.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("4 definition(s) valid"), "stdout: {}", stdout);
}

#[test]
fn test_check_valid_library_json() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());

    let output = run_lifecourse(&["--json", "check", defs.to_str().unwrap()]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["jsonrpc"], "2.0");
    let names: Vec<&str> = json["result"]["definitions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["adult_female", "diabetic", "hypertensive", "never_treated"]
    );
}

#[test]
fn test_check_single_definition_file() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(
        dir.path(),
        "smoker.json",
        &serde_json::json!({
            "condition_type": "Attribute",
            "attribute": "smoker",
            "operator": "==",
            "value": true
        }),
    );

    let output = run_lifecourse(&["--json", "check", defs.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["result"]["definitions"][0], "smoker");
}

#[test]
fn test_check_reports_every_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(
        dir.path(),
        "defs.json",
        &serde_json::json!({
            "fine": { "condition_type": "True" },
            "bad_unit": {
                "condition_type": "Age", "operator": ">=", "quantity": 5, "unit": "decades"
            },
            "bad_child": {
                "condition_type": "Or",
                "conditions": [
                    { "condition_type": "True" },
                    { "condition_type": "Date", "operator": "=>", "year": 2000 }
                ]
            }
        }),
    );

    let output = run_lifecourse(&["--json", "check", defs.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(exit_codes::CONFIG_ERROR));

    let json = stdout_json(&output);
    assert_eq!(json["error"]["code"], -32000 - exit_codes::CONFIG_ERROR);
    let errors: Vec<&str> = json["error"]["data"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.starts_with("$.bad_unit") && e.contains("decades")));
    assert!(errors
        .iter()
        .any(|e| e.starts_with("$.bad_child.conditions[1]") && e.contains("=>")));
}

#[test]
fn test_check_errors_in_text_mode() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(
        dir.path(),
        "defs.json",
        &serde_json::json!({ "untyped": { "gender": "M" } }),
    );

    let output = run_lifecourse(&["--no-json", "check", defs.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success());
    assert!(stdout.contains("1 error(s)"), "stdout: {}", stdout);
    assert!(stdout.contains("$.untyped"), "stdout: {}", stdout);
}

#[test]
fn test_check_accepts_json5() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defs.json5");
    std::fs::write(
        &path,
        r#"{
            // hand-written definitions
            teen: {
                condition_type: "At Least",
                minimum: 1,
                conditions: [
                    { condition_type: "Age", operator: ">=", quantity: 13, unit: "years" },
                ],
            },
        }"#,
    )
    .unwrap();

    let output = run_lifecourse(&["--json", "check", path.to_str().unwrap()]);
    assert!(output.status.success(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
    assert_eq!(stdout_json(&output)["result"]["definitions"][0], "teen");
}

#[test]
fn test_check_missing_file() {
    let output = run_lifecourse(&["--json", "check", "/nonexistent/defs.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::CONFIG_ERROR));

    let json = stdout_json(&output);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("file not found"));
}
