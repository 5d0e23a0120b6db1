// crates/provisioner-providers/src/lib.rs
// ============================================================================
// Module: Provisioner Providers Library
// Description: Service provider variants and their shared capabilities.
// Purpose: Map broker lifecycle verbs onto staged infrastructure jobs.
// Dependencies: provisioner-core, async-trait, tokio, tracing
// ============================================================================

//! ## Overview
//! [`TerraformProvider`] implements [`provisioner_core::ServiceProvider`] on
//! top of a [`provisioner_core::JobRunner`]. [`TfJobRunner`] is the runner
//! that owns the job state machine and drives an
//! [`provisioner_core::InfraEngine`] in background tasks.
//! [`MergedInstanceCredentials`] is the credential merging capability shared
//! by provider variants.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod base;
pub mod tf;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use base::MergedInstanceCredentials;
pub use tf::TerraformProvider;
pub use tf::TfJobRunner;
pub use tf::TfServiceDefinition;
