// crates/provisioner-core/src/core/action.rs
// ============================================================================
// Module: Provisioner Action Definitions
// Description: Static descriptors of provision, update, and bind actions.
// Purpose: Describe templates, parameter mappings, and import rules per action.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! An [`ActionDefinition`] is compiled once per service version and is read
//! only at runtime. A plain action carries a single `template`. An import
//! (adoption) action carries a named `templates` set together with the
//! import variables that identify the pre-existing resources.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when validating action or service definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Definition is structurally invalid.
    #[error("invalid definition: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Mapping Types
// ============================================================================

/// Maps an infrastructure variable to an external resource attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// Variable name inside the template.
    pub tf_variable: String,
    /// Attribute name on the imported resource.
    pub parameter_name: String,
}

/// Declares a request variable that identifies a resource to adopt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportVariable {
    /// Request variable holding the external resource identifier.
    pub name: String,
    /// Template resource address the identifier is imported into.
    pub tf_resource: String,
}

/// Resolved import pair passed to the job runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResource {
    /// Template resource address.
    pub tf_resource: String,
    /// External (IaaS) resource identifier.
    pub iaas_resource: String,
}

// ============================================================================
// SECTION: Action Definition
// ============================================================================

/// Static description of how one lifecycle action is realized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Single template used by plain actions.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
    /// Named template set used by import actions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, String>,
    /// Parameter mappings for plain actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_mappings: Vec<ParameterMapping>,
    /// Variables naming resources to adopt; non-empty marks an import action.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_variables: Vec<ImportVariable>,
    /// Parameter mappings applied to imported resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_parameter_mappings: Vec<ParameterMapping>,
    /// Parameter names omitted from the generated template during import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_parameters_to_delete: Vec<String>,
}

impl ActionDefinition {
    /// Creates a plain action from a single template.
    #[must_use]
    pub fn plain(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Returns true when this action adopts existing resources.
    #[must_use]
    pub fn is_import(&self) -> bool {
        !self.import_variables.is_empty()
    }

    /// Validates the action against its declared kind.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Invalid`] when the template form does not
    /// match the action kind or the import variables are malformed.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let has_template = !self.template.trim().is_empty();
        let has_templates = !self.templates.is_empty();
        if has_template && has_templates {
            return Err(DefinitionError::Invalid(
                "action must set either template or templates, not both".to_string(),
            ));
        }
        if self.is_import() {
            if !has_templates {
                return Err(DefinitionError::Invalid(
                    "import action requires a templates set".to_string(),
                ));
            }
        } else if !has_template {
            return Err(DefinitionError::Invalid("action requires a template".to_string()));
        }
        if let Some(name) = self.templates.keys().find(|name| name.trim().is_empty()) {
            return Err(DefinitionError::Invalid(format!("template name {name:?} is empty")));
        }

        let mut seen = BTreeSet::new();
        for variable in &self.import_variables {
            if variable.name.trim().is_empty() {
                return Err(DefinitionError::Invalid("import variable name is empty".to_string()));
            }
            if variable.tf_resource.trim().is_empty() {
                return Err(DefinitionError::Invalid(format!(
                    "import variable {} has no tf_resource",
                    variable.name
                )));
            }
            if !seen.insert(variable.name.as_str()) {
                return Err(DefinitionError::Invalid(format!(
                    "duplicate import variable {}",
                    variable.name
                )));
            }
        }
        Ok(())
    }
}
