// crates/provisioner-core/src/core/mod.rs
// ============================================================================
// Module: Provisioner Core Types
// Description: Catalog, action, workspace, job, and variable-context types.
// Purpose: Provide stable, serializable types shared by resolver and orchestrator.
// Dependencies: serde, serde_json, url
// ============================================================================

//! ## Overview
//! Core types are the canonical data model of the provisioner. Catalog types
//! are what clients see; action definitions and workspaces are what the
//! infrastructure engine consumes; job records are what the job runner
//! persists.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod action;
pub mod catalog;
pub mod config_value;
pub mod hashing;
pub mod identifiers;
pub mod instance;
pub mod job;
pub mod varcontext;
pub mod workspace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use action::ActionDefinition;
pub use action::DefinitionError;
pub use action::ImportResource;
pub use action::ImportVariable;
pub use action::ParameterMapping;
pub use catalog::Plan;
pub use catalog::ServiceDefinition;
pub use config_value::ConfigValue;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;
pub use identifiers::BindingId;
pub use identifiers::InstanceId;
pub use identifiers::JobId;
pub use instance::BindingCredentials;
pub use instance::DeprovisionDetails;
pub use instance::InstanceDetails;
pub use instance::OperationType;
pub use job::EngineOutcome;
pub use job::JobOperation;
pub use job::JobRecord;
pub use job::JobState;
pub use job::JobStatus;
pub use job::Outputs;
pub use varcontext::VarContext;
pub use varcontext::VarContextBuilder;
pub use varcontext::VarContextError;
pub use varcontext::VarReader;
pub use workspace::DEFAULT_INSTANCE_NAME;
pub use workspace::MAIN_TEMPLATE_NAME;
pub use workspace::Workspace;
pub use workspace::WorkspaceError;
