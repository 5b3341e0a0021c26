// integration tests for the eval command

use crate::common::*;
use lifecourse::cli::exit_codes;

fn results_by_name(json: &serde_json::Value) -> Vec<(String, bool)> {
    json["result"]["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["name"].as_str().unwrap().to_string(),
                r["result"].as_bool().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_eval_library_json() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
        "--at",
        "2020-01-01",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["result"]["subject"], "p-1");
    assert_eq!(json["result"]["at"], 1_577_836_800_000_i64);
    assert_eq!(
        results_by_name(&json),
        vec![
            ("adult_female".to_string(), true),
            ("diabetic".to_string(), true),
            ("hypertensive".to_string(), true),
            ("never_treated".to_string(), false),
        ]
    );
}

#[test]
fn test_eval_time_changes_age_result() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
        "--at",
        "1980-01-01",
        "--name",
        "adult_female",
    ]);
    assert!(output.status.success());
    assert_eq!(
        results_by_name(&stdout_json(&output)),
        vec![("adult_female".to_string(), false)]
    );
}

#[test]
fn test_eval_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--no-json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
        "--at",
        "2020-01-01",
        "--name",
        "diabetic",
    ]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "diabetic: true");
}

#[test]
fn test_eval_subject_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse_with_env(
        &["--json", "eval", defs.to_str().unwrap(), "--at", "0", "--name", "hypertensive"],
        &[("LIFECOURSE_SUBJECT", subject.to_str().unwrap())],
    );
    assert!(output.status.success(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
    assert_eq!(
        results_by_name(&stdout_json(&output)),
        vec![("hypertensive".to_string(), true)]
    );
}

#[test]
fn test_eval_without_subject() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());

    let output = run_lifecourse(&["--json", "eval", defs.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(exit_codes::SUBJECT_ERROR));
    assert!(stdout_json(&output)["error"]["message"]
        .as_str()
        .unwrap()
        .contains("LIFECOURSE_SUBJECT"));
}

#[test]
fn test_eval_unknown_name() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
        "--name",
        "missing",
    ]);
    assert_eq!(output.status.code(), Some(exit_codes::NOT_FOUND));
}

#[test]
fn test_eval_invalid_time() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(dir.path(), "defs.json", &sample_definitions());
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
        "--at",
        "next tuesday",
    ]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID_ARGS));
}

#[test]
fn test_eval_rejects_invalid_definitions() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(
        dir.path(),
        "defs.json",
        &serde_json::json!({ "broken": { "condition_type": "Active Medication" } }),
    );
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(exit_codes::CONFIG_ERROR));
}

#[test]
fn test_eval_warning_logged_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let defs = write_json(
        dir.path(),
        "defs.json",
        &serde_json::json!({
            "on_statin": {
                "condition_type": "Active Medication",
                "referenced_by_attribute": "gender"
            }
        }),
    );
    let subject = write_json(dir.path(), "subject.json", &sample_subject());

    let output = run_lifecourse(&[
        "--json",
        "eval",
        defs.to_str().unwrap(),
        "--subject",
        subject.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert_eq!(
        results_by_name(&stdout_json(&output)),
        vec![("on_statin".to_string(), false)]
    );
    // gender holds text, not a record entry
    assert!(String::from_utf8_lossy(&output.stderr).contains("WARN"));
}
