// crates/provisioner-core/src/core/varcontext.rs
// ============================================================================
// Module: Provisioner Variable Context
// Description: Validated request variables with deferred error reporting.
// Purpose: Collect coercion errors and surface them through a single check.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`VarContext`] is an immutable map of request variables produced by
//! [`VarContextBuilder`]. Reads go through a [`VarReader`] whose accessors
//! never fail individually: they return a default and record the problem.
//! Callers read every field they need, then call [`VarReader::finish`]
//! before trusting any of the values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Accumulated variable errors, reported once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("; "))]
pub struct VarContextError {
    /// Individual error messages in the order they were recorded.
    messages: Vec<String>,
}

impl VarContextError {
    /// Creates an error from recorded messages.
    #[must_use]
    pub const fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Returns the individual error messages.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds a [`VarContext`] from layered sources.
#[derive(Debug, Clone, Default)]
pub struct VarContextBuilder {
    /// Values collected so far.
    values: Map<String, Value>,
    /// Errors collected so far.
    errors: Vec<String>,
}

impl VarContextBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a map; incoming values win.
    #[must_use]
    pub fn merge_map(mut self, values: &Map<String, Value>) -> Self {
        for (key, value) in values {
            self.values.insert(key.clone(), value.clone());
        }
        self
    }

    /// Merges a JSON object document, recording an error if it is not one.
    #[must_use]
    pub fn merge_json_object(mut self, document: &str) -> Self {
        if document.trim().is_empty() {
            return self;
        }
        match serde_json::from_str::<Value>(document) {
            Ok(Value::Object(map)) => {
                for (key, value) in map {
                    self.values.insert(key, value);
                }
            }
            Ok(other) => self.errors.push(format!("expected a JSON object, got {}", json_kind(&other))),
            Err(err) => self.errors.push(format!("invalid JSON object: {err}")),
        }
        self
    }

    /// Sets values only for keys that are still absent.
    #[must_use]
    pub fn merge_defaults(mut self, defaults: &Map<String, Value>) -> Self {
        for (key, value) in defaults {
            self.values.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self
    }

    /// Sets one value, replacing any existing one.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Finishes the builder.
    ///
    /// # Errors
    ///
    /// Returns [`VarContextError`] listing every error recorded while merging.
    pub fn build(self) -> Result<VarContext, VarContextError> {
        if self.errors.is_empty() {
            Ok(VarContext { values: self.values })
        } else {
            Err(VarContextError::new(self.errors))
        }
    }
}

// ============================================================================
// SECTION: Variable Context
// ============================================================================

/// Immutable map of validated request variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarContext {
    /// Variable values.
    values: Map<String, Value>,
}

impl VarContext {
    /// Wraps an existing map.
    #[must_use]
    pub const fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Returns the raw value of a variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a borrowed view of all variables.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Returns an owned copy of all variables.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.values.clone()
    }

    /// Starts a deferred-error read session.
    #[must_use]
    pub const fn reader(&self) -> VarReader<'_> {
        VarReader {
            context: self,
            errors: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Typed accessors that record errors instead of returning them.
#[derive(Debug)]
pub struct VarReader<'a> {
    /// Context being read.
    context: &'a VarContext,
    /// Errors recorded by accessors.
    errors: Vec<String>,
}

impl<'a> VarReader<'a> {
    /// Reads a string; scalars are stringified.
    pub fn string(&mut self, key: &str) -> String {
        match self.lookup(key) {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Number(value)) => value.to_string(),
            Some(Value::Bool(value)) => value.to_string(),
            Some(_) => self.type_error(key, "string"),
            None => String::new(),
        }
    }

    /// Reads a string that must hold at least one non-whitespace character.
    pub fn non_empty_string(&mut self, key: &str) -> String {
        let recorded = self.errors.len();
        let value = self.string(key);
        if self.errors.len() == recorded && value.trim().is_empty() {
            return self.type_error(key, "non-empty string");
        }
        value
    }

    /// Reads a signed integer; numeric strings are parsed.
    pub fn integer(&mut self, key: &str) -> i64 {
        let parsed = match self.lookup(key) {
            Some(Value::Number(value)) => value.as_i64(),
            Some(Value::String(value)) => value.trim().parse().ok(),
            Some(_) => None,
            None => return 0,
        };
        parsed.unwrap_or_else(|| self.type_error(key, "integer"))
    }

    /// Reads a boolean; `"true"` and `"false"` strings are parsed.
    pub fn boolean(&mut self, key: &str) -> bool {
        let parsed = match self.lookup(key) {
            Some(Value::Bool(value)) => Some(*value),
            Some(Value::String(value)) => value.trim().parse().ok(),
            Some(_) => None,
            None => return false,
        };
        parsed.unwrap_or_else(|| self.type_error(key, "boolean"))
    }

    /// Reads an object of string values.
    pub fn string_map(&mut self, key: &str) -> BTreeMap<String, String> {
        match self.lookup(key) {
            Some(Value::Object(map)) => {
                let mut out = BTreeMap::new();
                for (name, value) in map {
                    match value {
                        Value::String(text) => {
                            out.insert(name.clone(), text.clone());
                        }
                        _ => return self.type_error(key, "map of strings"),
                    }
                }
                out
            }
            Some(_) => self.type_error(key, "map of strings"),
            None => BTreeMap::new(),
        }
    }

    /// Returns true when any accessor has recorded an error.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Ends the read session.
    ///
    /// # Errors
    ///
    /// Returns [`VarContextError`] when any accessor recorded an error.
    pub fn finish(self) -> Result<(), VarContextError> {
        if self.errors.is_empty() { Ok(()) } else { Err(VarContextError::new(self.errors)) }
    }

    /// Looks up a key, recording a missing-value error.
    fn lookup(&mut self, key: &str) -> Option<&'a Value> {
        let context: &'a VarContext = self.context;
        let value = context.values.get(key);
        if value.is_none() {
            self.errors.push(format!("missing value \"{key}\""));
        }
        value
    }

    /// Records a type error and returns the type's default.
    fn type_error<T: Default>(&mut self, key: &str, expected: &str) -> T {
        self.errors.push(format!("value for \"{key}\" must be a {expected}"));
        T::default()
    }
}

/// Names the JSON kind of a value for error messages.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
