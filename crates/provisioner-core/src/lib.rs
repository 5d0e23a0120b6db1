// crates/provisioner-core/src/lib.rs
// ============================================================================
// Module: Provisioner Core Library
// Description: Public API surface for the Provisioner core.
// Purpose: Expose catalog models, job types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Provisioner core defines the data model shared by the catalog resolver and
//! the provisioning orchestrator: service definitions and plans, action
//! definitions, staged workspaces, job records, and the variable context.
//! Collaborators plug in through explicit interfaces (configuration provider,
//! job store, infrastructure engine, job runner, service provider) so that the
//! broker never depends on process-wide state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ConfigProvider;
pub use interfaces::CredentialMerger;
pub use interfaces::EngineError;
pub use interfaces::InfraEngine;
pub use interfaces::JobRunner;
pub use interfaces::JobRunnerError;
pub use interfaces::JobStore;
pub use interfaces::ProviderError;
pub use interfaces::ServiceProvider;
pub use interfaces::StoreError;
pub use interfaces::UpdateError;
pub use runtime::Backoff;
pub use runtime::CancelHandle;
pub use runtime::InMemoryConfigProvider;
pub use runtime::InMemoryJobStore;
pub use runtime::PollPolicy;
pub use runtime::RequestContext;
