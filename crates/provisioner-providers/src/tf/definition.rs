// crates/provisioner-providers/src/tf/definition.rs
// ============================================================================
// Module: Terraform Service Definition
// Description: Compiled service version with its provision and bind actions.
// Purpose: Validate a service version once and derive its catalog default.
// Dependencies: provisioner-core, serde
// ============================================================================

//! ## Overview
//! A service version names its catalog identity (id, name, plans) and the
//! actions realizing provision and bind. Provision may adopt existing
//! resources through an import action; bind is always a plain apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use provisioner_core::ActionDefinition;
use provisioner_core::DefinitionError;
use provisioner_core::Plan;
use provisioner_core::ServiceDefinition;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Definition
// ============================================================================

/// One compiled version of an engine-backed service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfServiceDefinition {
    /// Catalog service id.
    pub id: String,
    /// Catalog service name.
    pub name: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
    /// Whether instances may be bound. Absent means bindable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindable: Option<bool>,
    /// Catalog tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Catalog metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Built-in plans.
    #[serde(default)]
    pub plans: Vec<Plan>,
    /// Action realizing provision and update.
    pub provision_settings: ActionDefinition,
    /// Action realizing bind.
    #[serde(default)]
    pub bind_settings: ActionDefinition,
}

impl TfServiceDefinition {
    /// Returns true unless the definition opts out of binding.
    #[must_use]
    pub fn is_bindable(&self) -> bool {
        self.bindable.unwrap_or(true)
    }

    /// Validates catalog identity and both actions.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::Invalid("service id must be non-empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(DefinitionError::Invalid(format!("service {} must have a name", self.id)));
        }
        let mut plan_ids = BTreeSet::new();
        for plan in &self.plans {
            if plan.id.trim().is_empty() {
                return Err(DefinitionError::Invalid(format!("service {} has a plan without an id", self.name)));
            }
            if !plan_ids.insert(plan.id.as_str()) {
                return Err(DefinitionError::Invalid(format!(
                    "service {} declares plan {} twice",
                    self.name, plan.id
                )));
            }
        }
        self.provision_settings.validate()?;
        if self.is_bindable() {
            self.bind_settings.validate()?;
            if self.bind_settings.is_import() {
                return Err(DefinitionError::Invalid(format!(
                    "service {} bind action must not declare import variables",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Returns the catalog definition advertised before any override.
    #[must_use]
    pub fn to_service_definition(&self) -> ServiceDefinition {
        ServiceDefinition {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            bindable: Some(self.is_bindable()),
            tags: self.tags.clone(),
            metadata: self.metadata.clone(),
            plans: self.plans.clone(),
            ..ServiceDefinition::default()
        }
    }
}
