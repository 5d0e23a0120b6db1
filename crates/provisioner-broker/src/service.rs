// crates/provisioner-broker/src/service.rs
// ============================================================================
// Module: Broker Service
// Description: Catalog resolution for a single brokered service.
// Purpose: Merge compiled defaults with operator overrides from configuration.
// Dependencies: provisioner-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`BrokerService`] reads three properties from configuration:
//! `service.<name>.enabled`, `service.<name>.definition` and
//! `service.<name>.plans`. The definition override replaces the compiled
//! default wholesale. User-defined plans are appended after the resolved
//! definition's own plans without deduplication, so a colliding plan id is
//! left visible to the operator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use provisioner_core::ConfigProvider;
use provisioner_core::Plan;
use provisioner_core::ServiceDefinition;
use thiserror::Error;
use tracing::warn;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog resolution errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The default or overridden definition is not valid JSON.
    #[error("Error parsing service definition for {name:?}: {message}")]
    ParseDefinition {
        /// Service name.
        name: String,
        /// Decoder message.
        message: String,
    },
    /// The user-defined plan list is not a JSON array of plans.
    #[error("Error parsing user-defined plans for {name:?}: {message}")]
    ParsePlans {
        /// Service name.
        name: String,
        /// Decoder message.
        message: String,
    },
    /// No plan with the given id exists in either source.
    #[error("Plan ID {id:?} could not be found")]
    PlanNotFound {
        /// Requested plan id.
        id: String,
    },
    /// No registered service resolves to the given id.
    #[error("Unknown service ID: {id:?}")]
    UnknownService {
        /// Requested service id.
        id: String,
    },
}

// ============================================================================
// SECTION: Property Names
// ============================================================================

/// Returns the property controlling whether a service is offered.
#[must_use]
pub fn enabled_property(name: &str) -> String {
    format!("service.{name}.enabled")
}

/// Returns the property holding a full definition override.
#[must_use]
pub fn definition_property(name: &str) -> String {
    format!("service.{name}.definition")
}

/// Returns the property holding additional plans.
#[must_use]
pub fn user_defined_plans_property(name: &str) -> String {
    format!("service.{name}.plans")
}

// ============================================================================
// SECTION: Broker Service
// ============================================================================

/// One brokered service and the configuration it resolves against.
#[derive(Clone)]
pub struct BrokerService {
    name: String,
    default_service_definition: String,
    config: Arc<dyn ConfigProvider>,
}

impl fmt::Debug for BrokerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerService")
            .field("name", &self.name)
            .field("default_service_definition", &self.default_service_definition)
            .finish_non_exhaustive()
    }
}

impl BrokerService {
    /// Creates a service from its name and raw default definition JSON.
    pub fn new(
        name: impl Into<String>,
        default_service_definition: impl Into<String>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self { name: name.into(), default_service_definition: default_service_definition.into(), config }
    }

    /// Creates a service whose default is a compiled definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseDefinition`] when the definition cannot be
    /// serialized.
    pub fn from_definition(
        name: impl Into<String>,
        definition: &ServiceDefinition,
        config: Arc<dyn ConfigProvider>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        let raw = serde_json::to_string(definition)
            .map_err(|err| CatalogError::ParseDefinition { name: name.clone(), message: err.to_string() })?;
        Ok(Self::new(name, raw, config))
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw default definition JSON.
    #[must_use]
    pub fn default_service_definition(&self) -> &str {
        &self.default_service_definition
    }

    /// Returns `service.<name>.enabled`.
    #[must_use]
    pub fn enabled_property(&self) -> String {
        enabled_property(&self.name)
    }

    /// Returns `service.<name>.definition`.
    #[must_use]
    pub fn definition_property(&self) -> String {
        definition_property(&self.name)
    }

    /// Returns `service.<name>.plans`.
    #[must_use]
    pub fn user_defined_plans_property(&self) -> String {
        user_defined_plans_property(&self.name)
    }

    /// Returns whether the service should be offered.
    ///
    /// Services are enabled unless configuration says otherwise. A value that
    /// cannot be read as a boolean disables the service.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        let property = self.enabled_property();
        match self.config.get_bool(&property) {
            None => true,
            Some(Some(enabled)) => enabled,
            Some(None) => {
                warn!(service = %self.name, property = %property, "enabled flag is not a boolean; treating service as disabled");
                false
            }
        }
    }

    /// Returns the override definition when one is set and non-empty,
    /// otherwise the parsed default.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseDefinition`] when the chosen JSON does not
    /// decode as a service definition.
    pub fn service_definition(&self) -> Result<ServiceDefinition, CatalogError> {
        let raw = self
            .non_empty_string(&self.definition_property())
            .unwrap_or_else(|| self.default_service_definition.clone());
        serde_json::from_str(&raw)
            .map_err(|err| CatalogError::ParseDefinition { name: self.name.clone(), message: err.to_string() })
    }

    /// Returns the operator-supplied plans, or an empty list when unset.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParsePlans`] when the value is not a JSON
    /// array of plans.
    pub fn user_defined_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        let Some(raw) = self.non_empty_string(&self.user_defined_plans_property()) else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw)
            .map_err(|err| CatalogError::ParsePlans { name: self.name.clone(), message: err.to_string() })
    }

    /// Finds a plan by id, checking the definition before user plans.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PlanNotFound`] when neither source has the id,
    /// or a parse error from either source.
    pub fn get_plan_by_id(&self, plan_id: &str) -> Result<Plan, CatalogError> {
        let definition = self.service_definition()?;
        if let Some(plan) = definition.plan(plan_id) {
            return Ok(plan.clone());
        }
        self.user_defined_plans()?
            .into_iter()
            .find(|plan| plan.id == plan_id)
            .ok_or_else(|| CatalogError::PlanNotFound { id: plan_id.to_string() })
    }

    /// Returns the client-visible entry: the resolved definition with user
    /// plans appended.
    ///
    /// # Errors
    ///
    /// Returns a parse error from the definition or the user plan list.
    pub fn catalog_entry(&self) -> Result<ServiceDefinition, CatalogError> {
        let mut definition = self.service_definition()?;
        let user_plans = self.user_defined_plans()?;
        definition.plans.extend(user_plans);
        Ok(definition)
    }

    fn non_empty_string(&self, property: &str) -> Option<String> {
        self.config.get_string(property).filter(|value| !value.trim().is_empty())
    }
}
