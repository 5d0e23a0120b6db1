// crates/provisioner-core/src/core/instance.rs
// ============================================================================
// Module: Provisioner Instance Records
// Description: Broker-visible instance and binding records.
// Purpose: Carry operation handles and opaque details between broker and providers.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Instance and binding records are persisted by an external collaborator.
//! Providers only return fresh [`InstanceDetails`] from lifecycle calls and
//! write captured outputs through [`InstanceDetails::set_other_details`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::BindingId;
use crate::core::identifiers::InstanceId;
use crate::core::identifiers::JobId;

// ============================================================================
// SECTION: Operation Types
// ============================================================================

/// Kind of asynchronous operation recorded on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Instance provisioning.
    Provision,
    /// Instance update.
    Update,
    /// Instance deprovisioning.
    Deprovision,
}

// ============================================================================
// SECTION: Instance Details
// ============================================================================

/// Broker-visible record of a provisioned instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceDetails {
    /// Instance identifier.
    #[serde(default)]
    pub id: InstanceId,
    /// Display name of the provisioned resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Region or location of the resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Console or API URL of the resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Operation handle (the job identifier) of the last accepted call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Kind of the last accepted operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    /// Opaque captured details, typically job outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_details: Option<Value>,
}

impl InstanceDetails {
    /// Creates a record stub for an instance.
    #[must_use]
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Creates the record returned when an operation has been accepted.
    #[must_use]
    pub fn for_operation(job_id: &JobId, operation_type: OperationType) -> Self {
        Self {
            operation_id: Some(job_id.as_str().to_string()),
            operation_type: Some(operation_type),
            ..Self::default()
        }
    }

    /// Replaces the opaque details with a serialized value.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the value cannot be serialized.
    pub fn set_other_details<T: Serialize>(&mut self, details: &T) -> Result<(), serde_json::Error> {
        self.other_details = Some(serde_json::to_value(details)?);
        Ok(())
    }

    /// Returns the opaque details as an object; non-objects yield an empty map.
    #[must_use]
    pub fn other_details_map(&self) -> Map<String, Value> {
        object_or_empty(self.other_details.as_ref())
    }
}

// ============================================================================
// SECTION: Binding Credentials
// ============================================================================

/// Broker-visible record of a binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingCredentials {
    /// Instance the binding belongs to.
    pub instance_id: InstanceId,
    /// Binding identifier.
    pub binding_id: BindingId,
    /// Opaque binding outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_details: Option<Value>,
}

impl BindingCredentials {
    /// Creates a binding record.
    #[must_use]
    pub const fn new(instance_id: InstanceId, binding_id: BindingId) -> Self {
        Self {
            instance_id,
            binding_id,
            other_details: None,
        }
    }

    /// Returns the opaque details as an object; non-objects yield an empty map.
    #[must_use]
    pub fn other_details_map(&self) -> Map<String, Value> {
        object_or_empty(self.other_details.as_ref())
    }
}

// ============================================================================
// SECTION: Deprovision Details
// ============================================================================

/// Details supplied with a deprovision request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprovisionDetails {
    /// Service identifier of the instance.
    #[serde(default)]
    pub service_id: String,
    /// Plan identifier of the instance.
    #[serde(default)]
    pub plan_id: String,
    /// Whether the client accepts an asynchronous response.
    #[serde(default)]
    pub accepts_incomplete: bool,
}

/// Clones an object value or returns an empty map.
fn object_or_empty(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
