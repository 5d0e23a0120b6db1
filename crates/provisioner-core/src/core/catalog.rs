// crates/provisioner-core/src/core/catalog.rs
// ============================================================================
// Module: Provisioner Catalog Model
// Description: Service definitions and plans advertised to broker clients.
// Purpose: Provide the JSON-compatible catalog types used by the resolver.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ServiceDefinition`] is one offering in the broker catalog and carries
//! an ordered list of [`Plan`] tiers. Both types tolerate partial documents:
//! every field is optional on the wire, and fields this crate does not model
//! are kept in `extra` so an operator override survives a round trip intact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Service Definition
// ============================================================================

/// One offering in the broker catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Globally unique service identifier.
    #[serde(default)]
    pub id: String,
    /// CLI-friendly service name.
    #[serde(default)]
    pub name: String,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether instances of this service can be bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindable: Option<bool>,
    /// Whether instances may change plans after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_updateable: Option<bool>,
    /// Free-form discovery tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Opaque presentation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Plans in advertised order.
    #[serde(default)]
    pub plans: Vec<Plan>,
    /// Fields preserved verbatim from the source document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceDefinition {
    /// Returns the first plan with the given identifier.
    #[must_use]
    pub fn plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == plan_id)
    }
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// A pricing or sizing tier of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan identifier, unique within a well-formed catalog.
    #[serde(default)]
    pub id: String,
    /// CLI-friendly plan name.
    #[serde(default)]
    pub name: String,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether the plan is free of charge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free: Option<bool>,
    /// Plan-level bindable override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindable: Option<bool>,
    /// Opaque presentation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Free-form parameter schemas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Value>,
    /// Fields preserved verbatim from the source document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Plan {
    /// Creates a plan with the given identifier and name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
