// crates/provisioner-broker/tests/broker_service.rs
// ============================================================================
// Module: Broker Service Tests
// Description: Property names, enable flags, overrides, and plan merging.
// Purpose: Ensure the advertised catalog matches operator configuration.
// Dependencies: provisioner-broker, provisioner-core, proptest
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeSet;

use common::DEFAULT_DEFINITION;
use common::SERVICE_NAME;
use common::TestResult;
use common::service_with;
use common::set_str;
use proptest::prelude::*;
use provisioner_broker::BrokerService;
use provisioner_broker::CatalogError;
use provisioner_broker::definition_property;
use provisioner_broker::enabled_property;
use provisioner_broker::user_defined_plans_property;
use provisioner_core::ConfigProvider;
use provisioner_core::ConfigValue;
use provisioner_core::InMemoryConfigProvider;
use provisioner_core::Plan;
use provisioner_core::ServiceDefinition;

fn plan_ids(plans: &[Plan]) -> BTreeSet<String> {
    plans.iter().map(|plan| plan.id.clone()).collect()
}

#[test]
fn property_names_follow_the_service_name() {
    let (service, _config) = service_with(DEFAULT_DEFINITION);
    assert_eq!(service.enabled_property(), "service.left-handed-smoke-sifter.enabled");
    assert_eq!(service.definition_property(), "service.left-handed-smoke-sifter.definition");
    assert_eq!(service.user_defined_plans_property(), "service.left-handed-smoke-sifter.plans");
}

#[test]
fn services_are_enabled_unless_configured_off() {
    let (service, config) = service_with(DEFAULT_DEFINITION);
    assert!(service.is_enabled());

    config.set(&service.enabled_property(), Some(ConfigValue::Bool(true)));
    assert!(service.is_enabled());
    config.set(&service.enabled_property(), Some(ConfigValue::Bool(false)));
    assert!(!service.is_enabled());

    set_str(&config, &service.enabled_property(), Some("TRUE"));
    assert!(service.is_enabled());
    set_str(&config, &service.enabled_property(), Some("0"));
    assert!(!service.is_enabled());
}

#[test]
fn unreadable_enabled_flag_disables_the_service() {
    let (service, config) = service_with(DEFAULT_DEFINITION);
    set_str(&config, &service.enabled_property(), Some("sometimes"));
    assert!(!service.is_enabled());
}

#[test]
fn definition_override_replaces_the_default() -> TestResult {
    let (service, config) = service_with(DEFAULT_DEFINITION);
    let defn = service.service_definition().map_err(|err| err.to_string())?;
    if defn.id != "abcd-efgh-ijkl" {
        return Err(format!("unexpected default id {}", defn.id));
    }

    set_str(&config, &service.definition_property(), Some(r#"{"id":"override-id"}"#));
    let defn = service.service_definition().map_err(|err| err.to_string())?;
    if defn.id != "override-id" {
        return Err(format!("unexpected override id {}", defn.id));
    }

    set_str(&config, &service.definition_property(), Some("nil"));
    let err = service.service_definition().expect_err("invalid override");
    let message = err.to_string();
    if !message.starts_with(r#"Error parsing service definition for "left-handed-smoke-sifter": "#) {
        return Err(format!("unexpected message {message}"));
    }

    set_str(&config, &service.definition_property(), Some(""));
    let defn = service.service_definition().map_err(|err| err.to_string())?;
    if defn.id != "abcd-efgh-ijkl" {
        return Err("empty override should fall back to the default".to_string());
    }
    Ok(())
}

#[test]
fn structured_override_values_are_accepted() {
    let (service, config) = service_with(DEFAULT_DEFINITION);
    config.set(
        &service.definition_property(),
        Some(ConfigValue::Json(serde_json::json!({"id": "from-toml", "plans": [{"id": "p"}]}))),
    );
    let entry = service.catalog_entry().expect("catalog entry");
    assert_eq!(entry.id, "from-toml");
    assert_eq!(plan_ids(&entry.plans), BTreeSet::from(["p".to_string()]));
}

#[test]
fn get_plan_by_id_searches_definition_then_user_plans() {
    let (service, config) = service_with(
        r#"{"id":"abcd-efgh-ijkl", "plans": [{"id": "builtin-plan", "name": "Builtin!"}]}"#,
    );
    set_str(&config, &service.user_defined_plans_property(), Some(r#"[{"id":"custom-plan", "name": "Custom!"}]"#));

    assert_eq!(service.get_plan_by_id("builtin-plan").expect("builtin").name, "Builtin!");
    assert_eq!(service.get_plan_by_id("custom-plan").expect("custom").name, "Custom!");

    let err = service.get_plan_by_id("missing-plan").expect_err("missing");
    assert!(matches!(err, CatalogError::PlanNotFound { .. }));
    assert_eq!(err.to_string(), r#"Plan ID "missing-plan" could not be found"#);
}

#[test]
fn duplicate_plan_ids_resolve_to_the_definition_plan() {
    let (service, config) = service_with(r#"{"id":"s", "plans": [{"id": "dup", "name": "builtin"}]}"#);
    set_str(&config, &service.user_defined_plans_property(), Some(r#"[{"id":"dup", "name": "user"}]"#));
    assert_eq!(service.get_plan_by_id("dup").expect("plan").name, "builtin");
    assert_eq!(service.catalog_entry().expect("entry").plans.len(), 2);
}

#[test]
fn user_defined_plans_cases() -> TestResult {
    let cases: [(&str, Option<&str>, &[&str], bool); 4] = [
        ("default-no-plans", None, &[], false),
        ("single-plan", Some(r#"[{"id":"aaa"}]"#), &["aaa"], false),
        ("bad-json", Some("42"), &[], true),
        ("multiple-plans", Some(r#"[{"id":"aaa"},{"id":"bbb"}]"#), &["aaa", "bbb"], false),
    ];
    let (service, config) = service_with(DEFAULT_DEFINITION);

    for (name, value, expected, expect_error) in cases {
        set_str(&config, &service.user_defined_plans_property(), value);
        let result = service.user_defined_plans();
        if result.is_err() != expect_error {
            return Err(format!("{name}) expected error? {expect_error}, got {result:?}"));
        }
        let plans = result.unwrap_or_default();
        let expected: BTreeSet<String> = expected.iter().map(ToString::to_string).collect();
        if plan_ids(&plans) != expected || plans.len() != expected.len() {
            return Err(format!("{name}) expected plans {expected:?}, got {plans:?}"));
        }
    }
    Ok(())
}

#[test]
fn catalog_entry_concatenates_plans() -> TestResult {
    let custom_definition = r#"{"id":"abcd-efgh-ijkl", "plans":[{"id":"zzz"}]}"#;
    let custom_plans = r#"[{"id":"aaa"},{"id":"bbb"}]"#;
    let cases: [(&str, Option<&str>, Option<&str>, &[&str], bool); 6] = [
        ("no-customization", None, None, &[], false),
        ("custom-definition", Some(custom_definition), None, &["zzz"], false),
        ("custom-plans", None, Some(custom_plans), &["aaa", "bbb"], false),
        ("custom-plans-and-definition", Some(custom_definition), Some(custom_plans), &["aaa", "bbb", "zzz"], false),
        ("bad-definition-json", Some("333"), None, &[], true),
        ("bad-plan-json", None, Some("333"), &[], true),
    ];
    let (service, config) = service_with(DEFAULT_DEFINITION);

    for (name, definition, plans, expected, expect_error) in cases {
        set_str(&config, &service.definition_property(), definition);
        set_str(&config, &service.user_defined_plans_property(), plans);
        match service.catalog_entry() {
            Ok(entry) if !expect_error => {
                let expected: BTreeSet<String> = expected.iter().map(ToString::to_string).collect();
                if entry.plans.len() != expected.len() || plan_ids(&entry.plans) != expected {
                    return Err(format!("{name}) expected plans {expected:?}, got {:?}", entry.plans));
                }
            }
            Err(_) if expect_error => {}
            other => return Err(format!("{name}) expected error? {expect_error}, got {other:?}")),
        }
    }
    Ok(())
}

#[test]
fn catalog_entry_keeps_definition_plans_first() {
    let (service, config) = service_with(r#"{"id":"s", "plans":[{"id":"own-1"},{"id":"own-2"}]}"#);
    set_str(&config, &service.user_defined_plans_property(), Some(r#"[{"id":"user-1"}]"#));
    let ids: Vec<String> = service.catalog_entry().expect("entry").plans.into_iter().map(|plan| plan.id).collect();
    assert_eq!(ids, vec!["own-1", "own-2", "user-1"]);
}

#[test]
fn compiled_definitions_round_trip_as_defaults() {
    let mut definition = ServiceDefinition { id: "compiled".to_string(), ..ServiceDefinition::default() };
    definition.plans.push(Plan::new("small", "Small"));
    let config: std::sync::Arc<dyn ConfigProvider> = std::sync::Arc::new(InMemoryConfigProvider::new());
    let service = BrokerService::from_definition(SERVICE_NAME, &definition, config).expect("service");
    assert_eq!(service.service_definition().expect("definition"), definition);
}

#[test]
fn bad_plan_errors_name_the_service() {
    let (service, config) = service_with(DEFAULT_DEFINITION);
    set_str(&config, &service.user_defined_plans_property(), Some(r#"{"id":"not-a-list"}"#));
    let err = service.user_defined_plans().expect_err("object is not a list");
    assert!(err.to_string().starts_with(r#"Error parsing user-defined plans for "left-handed-smoke-sifter""#));
}

proptest! {
    #[test]
    fn property_names_are_distinct_per_service(a in "[a-z][a-z0-9-]{0,20}", b in "[a-z][a-z0-9-]{0,20}") {
        prop_assert_eq!(enabled_property(&a), enabled_property(&a));
        let names = [enabled_property(&a), definition_property(&a), user_defined_plans_property(&a)];
        prop_assert_eq!(names.iter().collect::<BTreeSet<_>>().len(), 3);
        if a != b {
            prop_assert_ne!(enabled_property(&a), enabled_property(&b));
            prop_assert_ne!(definition_property(&a), definition_property(&b));
            prop_assert_ne!(user_defined_plans_property(&a), user_defined_plans_property(&b));
        }
    }
}
