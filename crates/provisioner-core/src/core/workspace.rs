// crates/provisioner-core/src/core/workspace.rs
// ============================================================================
// Module: Provisioner Workspace
// Description: Self-contained input of one staged infrastructure job.
// Purpose: Bundle templates, variables, mappings, and engine state per job.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Workspace`] is everything the infrastructure engine needs to run a
//! job. It is built per lifecycle call and handed to the job runner, which
//! owns it from that point on. Only the runner mutates it afterwards:
//! updates merge new variables, and engine runs replace the opaque state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::action::ParameterMapping;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Output namespace of the default (root) template instance.
pub const DEFAULT_INSTANCE_NAME: &str = "instance";

/// Template name used when a workspace is built from a single template.
pub const MAIN_TEMPLATE_NAME: &str = "brokertemplate";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when constructing a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    /// Neither a single template nor a template set was supplied.
    #[error("workspace requires at least one template")]
    NoTemplates,
    /// A template set entry has an empty name.
    #[error("workspace template name is empty")]
    EmptyTemplateName,
    /// A single template and a template set were both supplied.
    #[error("workspace cannot combine a single template with a template set")]
    AmbiguousTemplates,
}

// ============================================================================
// SECTION: Workspace
// ============================================================================

/// Staged input of one infrastructure job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Templates keyed by name.
    pub templates: BTreeMap<String, String>,
    /// Variable values passed to the templates.
    pub variables: Map<String, Value>,
    /// Variable to resource-attribute mappings used by import.
    #[serde(default)]
    pub parameter_mappings: Vec<ParameterMapping>,
    /// Parameter names removed from generated templates during import.
    #[serde(default)]
    pub parameters_to_delete: Vec<String>,
    /// Opaque engine state from the last completed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl Workspace {
    /// Builds a workspace from a single template or a named template set.
    ///
    /// An empty `template` selects the `templates` set.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] when no template is supplied, both forms are
    /// supplied, or a template name is empty.
    pub fn new(
        variables: Map<String, Value>,
        template: &str,
        templates: BTreeMap<String, String>,
        parameter_mappings: Vec<ParameterMapping>,
        parameters_to_delete: Vec<String>,
    ) -> Result<Self, WorkspaceError> {
        let templates = match (template.is_empty(), templates.is_empty()) {
            (false, false) => return Err(WorkspaceError::AmbiguousTemplates),
            (true, true) => return Err(WorkspaceError::NoTemplates),
            (false, true) => BTreeMap::from([(MAIN_TEMPLATE_NAME.to_string(), template.to_string())]),
            (true, false) => {
                if templates.keys().any(String::is_empty) {
                    return Err(WorkspaceError::EmptyTemplateName);
                }
                templates
            }
        };
        Ok(Self {
            templates,
            variables,
            parameter_mappings,
            parameters_to_delete,
            state: None,
        })
    }

    /// Merges variables into the workspace; incoming values win.
    pub fn merge_variables(&mut self, variables: &Map<String, Value>) {
        for (key, value) in variables {
            self.variables.insert(key.clone(), value.clone());
        }
    }
}
