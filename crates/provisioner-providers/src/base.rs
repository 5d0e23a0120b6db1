// crates/provisioner-providers/src/base.rs
// ============================================================================
// Module: Shared Provider Capabilities
// Description: Credential merging reused across provider variants.
// Purpose: Build binding credentials from instance and binding details.
// Dependencies: provisioner-core, serde_json
// ============================================================================

//! ## Overview
//! [`MergedInstanceCredentials`] combines the opaque details captured for an
//! instance with those captured for a binding. Binding keys win on conflict.
//! Providers hold the capability and call it explicitly from
//! `build_instance_credentials`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use provisioner_core::BindingCredentials;
use provisioner_core::CredentialMerger;
use provisioner_core::InstanceDetails;
use provisioner_core::ProviderError;
use provisioner_core::VarContextBuilder;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Merged Instance Credentials
// ============================================================================

/// Merges instance details with binding details, binding keys winning.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergedInstanceCredentials;

impl CredentialMerger for MergedInstanceCredentials {
    fn merge_credentials(
        &self,
        binding: &BindingCredentials,
        instance: &InstanceDetails,
    ) -> Result<Map<String, Value>, ProviderError> {
        let instance_details = details_object("instance", instance.other_details.as_ref())?;
        let binding_details = details_object("binding", binding.other_details.as_ref())?;
        let merged = VarContextBuilder::new().merge_map(&instance_details).merge_map(&binding_details).build()?;
        Ok(merged.to_map())
    }
}

/// Returns recorded details as an object; absent or null details are empty.
fn details_object(owner: &str, details: Option<&Value>) -> Result<Map<String, Value>, ProviderError> {
    match details {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ProviderError::Serialization(format!("{owner} details must be a JSON object"))),
    }
}
