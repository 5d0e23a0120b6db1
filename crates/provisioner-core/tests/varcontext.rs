// crates/provisioner-core/tests/varcontext.rs
// ============================================================================
// Module: Variable Context Tests
// Description: Tests for deferred-error variable reads.
// Purpose: Ensure accessor errors accumulate and surface once.
// Dependencies: provisioner-core, serde_json
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use provisioner_core::VarContext;
use provisioner_core::VarContextBuilder;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

type TestResult = Result<(), String>;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[test]
fn reader_returns_values_when_all_fields_are_valid() -> TestResult {
    let vars = VarContextBuilder::new()
        .merge_map(&object(json!({"tf_id": "tf:a:", "count": "3", "enabled": true})))
        .build()
        .map_err(|err| err.to_string())?;

    let mut reader = vars.reader();
    let tf_id = reader.string("tf_id");
    let count = reader.integer("count");
    let enabled = reader.boolean("enabled");
    reader.finish().map_err(|err| err.to_string())?;

    assert_eq!(tf_id, "tf:a:");
    assert_eq!(count, 3);
    assert!(enabled);
    Ok(())
}

#[test]
fn reader_accumulates_every_error_until_finish() {
    let vars = VarContext::from_map(object(json!({"count": "many", "labels": {"a": 1}})));
    let mut reader = vars.reader();
    assert_eq!(reader.string("tf_id"), "");
    assert_eq!(reader.integer("count"), 0);
    assert!(reader.string_map("labels").is_empty());
    assert!(reader.has_errors());

    let err = reader.finish().expect_err("errors are reported");
    assert_eq!(
        err.messages(),
        [
            "missing value \"tf_id\"".to_string(),
            "value for \"count\" must be a integer".to_string(),
            "value for \"labels\" must be a map of strings".to_string(),
        ]
    );
    assert!(err.to_string().contains("missing value \"tf_id\""));
}

#[test]
fn non_empty_string_rejects_blank_values() {
    let vars = VarContext::from_map(object(json!({"tf_id": "  ", "name": "b-1"})));
    let mut reader = vars.reader();
    assert_eq!(reader.non_empty_string("tf_id"), "");
    assert_eq!(reader.non_empty_string("name"), "b-1");
    assert_eq!(reader.non_empty_string("region"), "");

    let err = reader.finish().expect_err("blank and missing values are reported");
    assert_eq!(
        err.messages(),
        [
            "value for \"tf_id\" must be a non-empty string".to_string(),
            "missing value \"region\"".to_string(),
        ]
    );
}

#[test]
fn builder_layers_defaults_under_existing_values() -> TestResult {
    let vars = VarContextBuilder::new()
        .merge_json_object(r#"{"region": "us-east1"}"#)
        .merge_defaults(&object(json!({"region": "eu-west1", "tier": "small"})))
        .set("tf_id", "tf:x:")
        .build()
        .map_err(|err| err.to_string())?;

    assert_eq!(vars.get("region"), Some(&json!("us-east1")));
    assert_eq!(vars.get("tier"), Some(&json!("small")));
    assert_eq!(vars.to_map().len(), 3);
    Ok(())
}

#[test]
fn builder_rejects_non_object_documents() {
    let err = VarContextBuilder::new()
        .merge_json_object("[1, 2]")
        .merge_json_object("{not json")
        .build()
        .expect_err("both documents are rejected");
    assert_eq!(err.messages().len(), 2);
    assert_eq!(err.messages()[0], "expected a JSON object, got array");
}
