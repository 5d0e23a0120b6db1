// crates/provisioner-config/src/layered.rs
// ============================================================================
// Module: Layered Property Lookup
// Description: Config provider merging defaults, file, environment, and overrides.
// Purpose: Answer catalog property lookups with deterministic precedence.
// Dependencies: provisioner-core
// ============================================================================

//! ## Overview
//! [`LayeredConfig`] resolves a property key by checking, in order, runtime
//! overrides, environment variables, the configuration file, and registered
//! defaults. The first layer holding the key wins.
//!
//! Environment names are derived from property keys: `PROVISIONER_` followed
//! by the upper-cased key with `.` written as `__` and `-` written as `_`, so
//! `service.my-db.enabled` reads `PROVISIONER_SERVICE__MY_DB__ENABLED`. Only
//! keys made of lowercase ASCII alphanumeric segments have an environment
//! name. A segment may contain single interior `-`. Other keys, such as
//! `service.my_db.enabled`, skip the environment layer, which keeps distinct
//! keys on distinct variables. Environment values are always strings;
//! coercion happens at the accessor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::sync::PoisonError;
use std::sync::RwLock;

use provisioner_core::ConfigProvider;
use provisioner_core::ConfigValue;

use crate::config::BrokerConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix applied to every environment variable name.
pub const ENV_PREFIX: &str = "PROVISIONER_";

// ============================================================================
// SECTION: Layered Config
// ============================================================================

/// Configuration provider with override > environment > file > default precedence.
#[derive(Debug, Default)]
pub struct LayeredConfig {
    defaults: BTreeMap<String, ConfigValue>,
    file: BTreeMap<String, ConfigValue>,
    environment: BTreeMap<String, String>,
    overrides: RwLock<BTreeMap<String, ConfigValue>>,
}

impl LayeredConfig {
    /// Creates an empty layered config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layered config from a loaded broker config and the process
    /// environment.
    #[must_use]
    pub fn from_broker_config(config: &BrokerConfig) -> Self {
        Self::new().with_file_values(config.service_properties()).with_process_env()
    }

    /// Registers a default value.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Replaces the file layer.
    #[must_use]
    pub fn with_file_values(mut self, values: BTreeMap<String, ConfigValue>) -> Self {
        self.file = values;
        self
    }

    /// Replaces the environment layer with a snapshot of the process
    /// environment, keeping only `PROVISIONER_` variables.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_environment(env::vars())
    }

    /// Replaces the environment layer with explicit variables.
    #[must_use]
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = vars
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .filter(|(name, _)| name.starts_with(ENV_PREFIX))
            .collect();
        self
    }

    fn overrides_get(&self, key: &str) -> Option<ConfigValue> {
        self.overrides.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }
}

impl ConfigProvider for LayeredConfig {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.overrides_get(key) {
            return Some(value);
        }
        if let Some(value) = env_var_name(key).and_then(|name| self.environment.get(&name)) {
            return Some(ConfigValue::String(value.clone()));
        }
        self.file.get(key).or_else(|| self.defaults.get(key)).cloned()
    }

    fn set(&self, key: &str, value: Option<ConfigValue>) {
        let mut overrides = self.overrides.write().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                overrides.insert(key.to_string(), value);
            }
            None => {
                overrides.remove(key);
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the environment variable name consulted for a property key.
///
/// Returns `None` when the key has no unambiguous environment encoding.
#[must_use]
pub fn env_var_name(key: &str) -> Option<String> {
    if !key.split('.').all(is_env_segment) {
        return None;
    }
    let mut name = String::with_capacity(ENV_PREFIX.len() + key.len() * 2);
    name.push_str(ENV_PREFIX);
    for ch in key.chars() {
        match ch {
            '.' => name.push_str("__"),
            '-' => name.push('_'),
            other => name.push(other.to_ascii_uppercase()),
        }
    }
    Some(name)
}

/// Returns true for non-empty `[a-z0-9]` runs joined by single `-`.
fn is_env_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('-')
        && !segment.ends_with('-')
        && !segment.contains("--")
        && segment.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}
