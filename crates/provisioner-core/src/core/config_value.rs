// crates/provisioner-core/src/core/config_value.rs
// ============================================================================
// Module: Provisioner Configuration Values
// Description: Typed values exchanged with configuration providers.
// Purpose: Provide lenient, explicit coercions for layered configuration reads.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Configuration layers disagree on types: environment variables are always
//! strings, TOML files carry native scalars, and runtime overrides may carry
//! arbitrary JSON. [`ConfigValue`] keeps the original form and exposes the
//! coercions the catalog resolver needs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Config Value
// ============================================================================

/// Typed configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    String(String),
    /// Structured JSON value.
    Json(Value),
}

impl ConfigValue {
    /// Coerces the value to a boolean.
    ///
    /// Strings accept `true`/`false`, `t`/`f`, `yes`/`no`, and `1`/`0` in
    /// any case. Integers map non-zero to `true`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Integer(value) => Some(*value != 0),
            Self::Float(_) => None,
            Self::String(value) => parse_bool(value),
            Self::Json(Value::Bool(value)) => Some(*value),
            Self::Json(Value::String(value)) => parse_bool(value),
            Self::Json(_) => None,
        }
    }

    /// Coerces the value to a string.
    ///
    /// JSON strings yield their contents, JSON `null` yields `None`, and
    /// other JSON is serialized.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::Bool(value) => Some(value.to_string()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::String(value) => Some(value.clone()),
            Self::Json(Value::Null) => None,
            Self::Json(Value::String(value)) => Some(value.clone()),
            Self::Json(other) => Some(other.to_string()),
        }
    }
}

/// Parses the accepted boolean spellings.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Some(true),
        "false" | "f" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}
