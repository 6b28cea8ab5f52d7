//! Table-driven tests for configuration loading and validation.

mod common;

use std::path::PathBuf;

use common::*;
use lexpipe::config::{load_config, load_config_from_str, load_or_default, resolve_config_path};
use lexpipe::pipeline::{FailurePolicy, Stage};

struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    /// Expected error substring when loading fails.
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_with_timeouts",
        config_json: r#"{
            "version": "1.0",
            "worker_count": 2,
            "stage_timeout_secs": 60,
            "run_deadline_secs": null
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_version",
        config_json: r#"{ "worker_count": 2 }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "unknown_language_default",
        config_json: r#"{
            "version": "1.0",
            "defaults": { "outputLanguage": "Klingon" }
        }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "unknown_stage_name",
        config_json: r#"{
            "version": "1.0",
            "stage_policies": { "ocr": "fatal" }
        }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "absorb_on_text_extraction",
        config_json: r#"{
            "version": "1.0",
            "stage_policies": { "extracting_text": "absorb" }
        }"#,
        should_succeed: false,
        expected_error: Some("Invalid stage policy for 'extracting_text'"),
    },
    ConfigTestCase {
        name: "absorb_on_persistence",
        config_json: r#"{
            "version": "1.0",
            "stage_policies": { "completed": "absorb" }
        }"#,
        should_succeed: false,
        expected_error: Some("Invalid stage policy for 'completed'"),
    },
    ConfigTestCase {
        name: "fatal_on_text_extraction_is_fine",
        config_json: r#"{
            "version": "1.0",
            "stage_policies": { "extracting_text": "fatal", "summarizing": "fatal" }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "not_json",
        config_json: "version = 1.0",
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
];

#[test]
fn test_config_loading_table() {
    for case in CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("[{}] expected success, got: {}", case.name, e),
            (false, Ok(_)) => panic!("[{}] expected failure, got success", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    assert!(
                        e.to_string().contains(expected),
                        "[{}] expected error containing '{}', got: {}",
                        case.name,
                        expected,
                        e
                    );
                }
            }
        }
    }
}

#[test]
fn test_written_config_round_trips() {
    let harness = TestHarness::new();
    let config = harness
        .config_builder()
        .worker_count(4)
        .stage_timeout_secs(45)
        .stage_policy(Stage::Translating, FailurePolicy::Fatal)
        .build();
    let path = harness.write_config("config.json", &config);

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.worker_count, 4);
    assert_eq!(loaded.stage_timeout_secs, Some(45));
    assert_eq!(loaded.upload_directory, config.upload_directory);
    assert_eq!(
        loaded.policies().policy(Stage::Translating),
        FailurePolicy::Fatal
    );
}

#[test]
fn test_missing_file_yields_defaults() {
    let harness = TestHarness::new();
    let missing = harness.config_dir.join("absent.json");

    let config = load_or_default(Some(missing.as_path())).unwrap();
    assert_eq!(config.version, "1.0");
    assert_eq!(config.bind_address, "0.0.0.0:3001");
}

#[test]
fn test_unreadable_path_reports_read_error() {
    let harness = TestHarness::new();
    let result = load_config(&harness.config_dir);
    assert!(result
        .unwrap_err()
        .to_string()
        .starts_with("Failed to read config file"));
}

#[test]
fn test_explicit_path_wins() {
    assert_eq!(
        resolve_config_path(Some("/etc/lexpipe.json")),
        Some(PathBuf::from("/etc/lexpipe.json"))
    );
}
