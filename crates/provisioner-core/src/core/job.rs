// crates/provisioner-core/src/core/job.rs
// ============================================================================
// Module: Provisioner Job Records
// Description: Persisted run-state of staged infrastructure jobs.
// Purpose: Define the job state machine vocabulary shared by runner and stores.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A job moves `Staged -> Running -> {Succeeded, Failed}`. Create and import
//! start from `Staged`; a succeeded job may enter `Running` again through
//! update or destroy. A failed job only leaves `Failed` by being staged again. Job records are never deleted by the
//! provisioner; retention is owned by the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::JobId;
use crate::core::workspace::Workspace;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Output values keyed by template instance name, then by output name.
pub type Outputs = BTreeMap<String, Map<String, Value>>;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Workspace recorded; no action has been issued.
    Staged,
    /// An engine action is in flight.
    Running,
    /// The last engine action completed successfully.
    Succeeded,
    /// The last engine action failed.
    Failed,
}

impl JobState {
    /// Returns the stable string form used by stores and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine action applied to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOperation {
    /// Initial apply of a staged workspace.
    Create,
    /// Re-apply with merged variables.
    Update,
    /// Tear down managed resources.
    Destroy,
    /// Adopt existing resources into managed state.
    Import,
}

impl JobOperation {
    /// Returns the stable string form used by stores and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for JobOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Job Record
// ============================================================================

/// Persisted state of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job identifier.
    pub id: JobId,
    /// Staged workspace, owned by the job runner.
    pub workspace: Workspace,
    /// Current lifecycle state.
    pub state: JobState,
    /// Last operation issued, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<JobOperation>,
    /// Failure message of the last failed operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Outputs captured by the last successful operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Outputs>,
    /// Unix timestamp of the last transition, in milliseconds.
    pub updated_at_ms: u64,
}

impl JobRecord {
    /// Creates a freshly staged record.
    #[must_use]
    pub fn staged(id: JobId, workspace: Workspace, updated_at_ms: u64) -> Self {
        Self {
            id,
            workspace,
            state: JobState::Staged,
            operation: None,
            last_error: None,
            outputs: None,
            updated_at_ms,
        }
    }

    /// Returns a non-blocking status snapshot of this record.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        let operation = self.operation.map_or("job", JobOperation::as_str);
        let (done, description) = match self.state {
            JobState::Staged => (false, "staged".to_string()),
            JobState::Running => (false, format!("{operation} in progress")),
            JobState::Succeeded => (true, format!("{operation} succeeded")),
            JobState::Failed => (
                true,
                format!("{operation} failed: {}", self.last_error.as_deref().unwrap_or("unknown error")),
            ),
        };
        JobStatus {
            state: self.state,
            done,
            description,
        }
    }
}

/// Status snapshot returned to pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Current lifecycle state.
    pub state: JobState,
    /// True once the job is terminal.
    pub done: bool,
    /// Human readable description.
    pub description: String,
}

/// Result of one successful engine action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutcome {
    /// Opaque engine state after the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    /// Output values per template instance.
    #[serde(default)]
    pub outputs: Outputs,
}
