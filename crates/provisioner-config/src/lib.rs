// crates/provisioner-config/src/lib.rs
// ============================================================================
// Module: Provisioner Config Library
// Description: Broker configuration model, validation, and layered lookup.
// Purpose: Single source of truth for provisioner.toml semantics.
// Dependencies: provisioner-core, provisioner-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `provisioner-config` loads `provisioner.toml` with strict, fail-closed
//! validation and turns it into the runtime pieces the broker needs: the
//! poll policy for job waits, the configured job store, and a
//! [`LayeredConfig`] that answers the catalog resolver's property lookups.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod layered;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use layered::ENV_PREFIX;
pub use layered::LayeredConfig;
pub use layered::env_var_name;
