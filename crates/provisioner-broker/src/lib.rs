// crates/provisioner-broker/src/lib.rs
// ============================================================================
// Module: Provisioner Broker Library
// Description: Catalog resolution and service registration.
// Purpose: Answer which services and plans exist and whether they are enabled.
// Dependencies: provisioner-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`BrokerService`] merges a compiled default service definition with
//! operator overrides read from a [`provisioner_core::ConfigProvider`]. The
//! [`ServiceRegistry`] holds every brokered service next to the provider
//! that realizes its lifecycle verbs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod registry;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use registry::RegisteredService;
pub use registry::RegistryError;
pub use registry::ServiceRegistry;
pub use service::BrokerService;
pub use service::CatalogError;
pub use service::definition_property;
pub use service::enabled_property;
pub use service::user_defined_plans_property;
