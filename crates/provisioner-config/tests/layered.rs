// crates/provisioner-config/tests/layered.rs
// ============================================================================
// Module: Layered Config Tests
// Description: Precedence and environment naming for property lookup.
// Purpose: Ensure overrides beat environment, file, and defaults in order.
// Dependencies: provisioner-config, provisioner-core, proptest
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;

use common::config_from_toml;
use proptest::prelude::*;
use provisioner_config::ENV_PREFIX;
use provisioner_config::LayeredConfig;
use provisioner_config::env_var_name;
use provisioner_core::ConfigProvider;
use provisioner_core::ConfigValue;

const KEY: &str = "service.google-storage.enabled";

#[test]
fn env_names_encode_separators_distinctly() {
    assert_eq!(env_var_name(KEY).as_deref(), Some("PROVISIONER_SERVICE__GOOGLE_STORAGE__ENABLED"));
    assert_eq!(env_var_name("service.cloudsql.plans").as_deref(), Some("PROVISIONER_SERVICE__CLOUDSQL__PLANS"));
    for key in ["service.my_db.enabled", "service.MyDb.enabled", "service..enabled", "service.-db.enabled", "service.a--b.plans"] {
        assert!(env_var_name(key).is_none(), "{key} has no environment name");
    }
}

#[test]
fn environment_override_reaches_only_its_own_service() {
    let config = LayeredConfig::new()
        .with_environment([(env_var_name("service.my-db.enabled").unwrap(), "false".to_string())]);
    assert_eq!(config.get_bool("service.my-db.enabled"), Some(Some(false)));
    assert!(config.get("service.my_db.enabled").is_none());
    assert!(config.get("service.my.db.enabled").is_none());

    let legacy = LayeredConfig::new().with_environment([("PROVISIONER_SERVICE_MY_DB_ENABLED", "false")]);
    assert!(legacy.get("service.my-db.enabled").is_none());
    assert!(legacy.get("service.my_db.enabled").is_none());
}

#[test]
fn layers_resolve_in_precedence_order() {
    let file = BTreeMap::from([(KEY.to_string(), ConfigValue::Bool(false))]);
    let config = LayeredConfig::new().with_default(KEY, true);
    assert_eq!(config.get_bool(KEY), Some(Some(true)));

    let config = config.with_file_values(file);
    assert_eq!(config.get_bool(KEY), Some(Some(false)));

    let config = config.with_environment([(env_var_name(KEY).unwrap(), "yes".to_string())]);
    assert_eq!(config.get(KEY), Some(ConfigValue::String("yes".to_string())));
    assert_eq!(config.get_bool(KEY), Some(Some(true)));

    config.set(KEY, Some(ConfigValue::Bool(false)));
    assert_eq!(config.get_bool(KEY), Some(Some(false)));

    config.set(KEY, None);
    assert_eq!(config.get_bool(KEY), Some(Some(true)));
}

#[test]
fn unrelated_environment_is_ignored() {
    let config = LayeredConfig::new().with_environment([("HOME", "/root"), ("SERVICE_X_ENABLED", "true")]);
    assert!(config.get("service.x.enabled").is_none());
    assert!(config.get("home").is_none());
}

#[test]
fn broker_config_feeds_the_file_layer() {
    let broker = config_from_toml("[service.cloudsql]\nenabled = false\n").expect("config");
    let config = LayeredConfig::new().with_file_values(broker.service_properties()).with_default(
        "service.cloudsql.plans",
        "[]",
    );
    assert_eq!(config.get_bool("service.cloudsql.enabled"), Some(Some(false)));
    assert_eq!(config.get_string("service.cloudsql.plans"), Some("[]".to_string()));
    assert!(config.get("service.spanner.enabled").is_none());
}

proptest! {
    #[test]
    fn env_names_are_prefixed_upper_snake(key in "[a-z0-9]{1,6}(-[a-z0-9]{1,6}){0,2}(\\.[a-z0-9]{1,6}(-[a-z0-9]{1,6}){0,2}){0,3}") {
        let name = env_var_name(&key).unwrap();
        prop_assert!(name.starts_with(ENV_PREFIX));
        let suffix = &name[ENV_PREFIX.len()..];
        prop_assert!(suffix.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_'));
    }

    #[test]
    fn distinct_keys_never_share_an_env_name(
        left in "[a-z0-9._-]{1,12}",
        right in "[a-z0-9._-]{1,12}",
    ) {
        if let (Some(a), Some(b)) = (env_var_name(&left), env_var_name(&right)) {
            prop_assert_eq!(a == b, left == right);
        }
    }
}
