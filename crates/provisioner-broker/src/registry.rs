// crates/provisioner-broker/src/registry.rs
// ============================================================================
// Module: Service Registry
// Description: Ordered registry of brokered services and their providers.
// Purpose: Build the advertised catalog and route requests to providers.
// Dependencies: provisioner-core, thiserror
// ============================================================================

//! ## Overview
//! Services are kept in registration order so the catalog is stable across
//! calls. Disabled services are omitted from the catalog but remain
//! registered, so toggling the enabled flag takes effect on the next lookup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use provisioner_core::ServiceDefinition;
use provisioner_core::ServiceProvider;
use thiserror::Error;

use crate::service::BrokerService;
use crate::service::CatalogError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A service with the same name is already registered.
    #[error("service {0:?} is already registered")]
    Duplicate(String),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// A registered service and the provider that realizes it.
#[derive(Clone)]
pub struct RegisteredService {
    /// Catalog resolver for the service.
    pub service: BrokerService,
    /// Lifecycle provider for the service.
    pub provider: Arc<dyn ServiceProvider>,
}

impl fmt::Debug for RegisteredService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredService").field("service", &self.service).finish_non_exhaustive()
    }
}

/// Registry of brokered services in registration order.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    entries: Vec<RegisteredService>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is already taken.
    pub fn register(
        &mut self,
        service: BrokerService,
        provider: Arc<dyn ServiceProvider>,
    ) -> Result<(), RegistryError> {
        if self.entries.iter().any(|entry| entry.service.name() == service.name()) {
            return Err(RegistryError::Duplicate(service.name().to_string()));
        }
        self.entries.push(RegisteredService { service, provider });
        Ok(())
    }

    /// Returns the names of enabled services in registration order.
    #[must_use]
    pub fn enabled_services(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.service.is_enabled())
            .map(|entry| entry.service.name())
            .collect()
    }

    /// Returns the catalog entries of every enabled service.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error encountered.
    pub fn catalog(&self) -> Result<Vec<ServiceDefinition>, CatalogError> {
        self.entries
            .iter()
            .filter(|entry| entry.service.is_enabled())
            .map(|entry| entry.service.catalog_entry())
            .collect()
    }

    /// Finds the registered service whose resolved definition has `service_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownService`] when no definition matches,
    /// or a resolution error raised while searching.
    pub fn service_by_id(&self, service_id: &str) -> Result<&RegisteredService, CatalogError> {
        for entry in &self.entries {
            if entry.service.service_definition()?.id == service_id {
                return Ok(entry);
            }
        }
        Err(CatalogError::UnknownService { id: service_id.to_string() })
    }

    /// Returns the provider registered under `name`.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<Arc<dyn ServiceProvider>> {
        self.entries
            .iter()
            .find(|entry| entry.service.name() == name)
            .map(|entry| Arc::clone(&entry.provider))
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
