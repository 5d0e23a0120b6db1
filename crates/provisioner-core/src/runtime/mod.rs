// crates/provisioner-core/src/runtime/mod.rs
// ============================================================================
// Module: Provisioner Runtime
// Description: Request scoping, polling policy, and in-memory collaborators.
// Purpose: Provide runtime helpers shared by job runners and providers.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime helpers are the parts of the provisioner that deal with time:
//! request cancellation and deadlines, and the backoff used while polling
//! jobs. In-memory collaborators live here as well.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod backoff;
pub mod context;
pub mod memory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backoff::Backoff;
pub use backoff::PollPolicy;
pub use context::CancelHandle;
pub use context::RequestContext;
pub use memory::InMemoryConfigProvider;
pub use memory::InMemoryJobStore;
