// crates/provisioner-core/tests/config_values.rs
// ============================================================================
// Module: Configuration Value Tests
// Description: Tests for config value coercion and the in-memory provider.
// Purpose: Ensure layered reads coerce consistently across value forms.
// Dependencies: provisioner-core, serde_json
// ============================================================================

use provisioner_core::ConfigProvider;
use provisioner_core::ConfigValue;
use provisioner_core::InMemoryConfigProvider;
use serde_json::json;

#[test]
fn booleans_coerce_from_common_spellings() {
    assert_eq!(ConfigValue::from("TRUE").as_bool(), Some(true));
    assert_eq!(ConfigValue::from("0").as_bool(), Some(false));
    assert_eq!(ConfigValue::from("no").as_bool(), Some(false));
    assert_eq!(ConfigValue::from(1_i64).as_bool(), Some(true));
    assert_eq!(ConfigValue::from(json!(false)).as_bool(), Some(false));
    assert_eq!(ConfigValue::from("maybe").as_bool(), None);
    assert_eq!(ConfigValue::from(json!({"on": true})).as_bool(), None);
}

#[test]
fn strings_unwrap_json_strings_and_serialize_other_json() {
    assert_eq!(ConfigValue::from(json!("raw")).as_string().as_deref(), Some("raw"));
    assert_eq!(ConfigValue::from(json!({"id": "a"})).as_string().as_deref(), Some(r#"{"id":"a"}"#));
    assert_eq!(ConfigValue::from(json!(null)).as_string(), None);
    assert_eq!(ConfigValue::from(false).as_string().as_deref(), Some("false"));
}

#[test]
fn in_memory_provider_sets_and_clears_values() {
    let config = InMemoryConfigProvider::with_values([("service.db.enabled", false)]);
    assert_eq!(config.get_bool("service.db.enabled"), Some(Some(false)));

    config.set("service.db.enabled", Some(ConfigValue::from("true")));
    assert_eq!(config.get_bool("service.db.enabled"), Some(Some(true)));

    config.set("service.db.enabled", None);
    assert_eq!(config.get("service.db.enabled"), None);
}

#[test]
fn in_memory_providers_are_isolated() {
    let left = InMemoryConfigProvider::new();
    let right = InMemoryConfigProvider::new();
    left.set("service.db.plans", Some(ConfigValue::from("[]")));
    assert!(right.get("service.db.plans").is_none());
    assert_eq!(left.clone().get_string("service.db.plans").as_deref(), Some("[]"));
}
