// crates/provisioner-core/src/core/identifiers.rs
// ============================================================================
// Module: Provisioner Identifiers
// Description: Opaque identifiers for instances, bindings, and jobs.
// Purpose: Provide strongly typed identifiers with stable, collision-free forms.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! Instance and binding identifiers are opaque strings supplied by the broker
//! protocol. Job identifiers are derived from them with a pure function so
//! that a retried request after a crash addresses the same job instead of
//! creating a duplicate.
//!
//! The derived form is `tf:<instance>:<binding>`. Each component is
//! percent-encoded, so a `:` inside an identifier can never shift the
//! boundary between components. Ordinary identifiers (UUIDs, slugs) are left
//! unchanged by the encoding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use url::form_urlencoded::byte_serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix shared by every derived job identifier.
const JOB_ID_PREFIX: &str = "tf";

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Service instance identifier assigned by the broker client.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Creates a new instance identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Service binding identifier assigned by the broker client.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingId(String);

impl BindingId {
    /// Creates a new binding identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BindingId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BindingId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Job identifier addressing one staged workspace in the job runner.
///
/// # Invariants
/// - Values produced by [`JobId::for_instance`] and [`JobId::for_binding`] are
///   a pure function of their inputs and distinct for distinct inputs.
/// - Values built with [`JobId::new`] are taken verbatim (for example a
///   `tf_id` read back from a variable context).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a job identifier from an existing raw value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the job identifier of an instance-scoped job.
    #[must_use]
    pub fn for_instance(instance: &InstanceId) -> Self {
        Self::derive(instance.as_str(), "")
    }

    /// Derives the job identifier of a binding-scoped job.
    #[must_use]
    pub fn for_binding(instance: &InstanceId, binding: &BindingId) -> Self {
        Self::derive(instance.as_str(), binding.as_str())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds `tf:<instance>:<binding>` from encoded components.
    fn derive(instance: &str, binding: &str) -> Self {
        let instance: String = byte_serialize(instance.as_bytes()).collect();
        let binding: String = byte_serialize(binding.as_bytes()).collect();
        Self(format!("{JOB_ID_PREFIX}:{instance}:{binding}"))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
