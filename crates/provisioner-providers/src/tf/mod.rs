// crates/provisioner-providers/src/tf/mod.rs
// ============================================================================
// Module: Terraform Provider Variant
// Description: Service definitions, job runner, and provider for engine-backed services.
// Purpose: Group the pieces of the engine-backed provider variant.
// Dependencies: provisioner-core
// ============================================================================

//! ## Overview
//! Services defined by infrastructure templates. A [`TfServiceDefinition`]
//! carries the provision and bind actions; the [`TerraformProvider`] turns
//! lifecycle verbs into jobs on a [`TfJobRunner`].

pub mod definition;
pub mod job_runner;
pub mod provider;

pub use definition::TfServiceDefinition;
pub use job_runner::TfJobRunner;
pub use provider::TerraformProvider;
