// crates/provisioner-core/src/interfaces/mod.rs
// ============================================================================
// Module: Provisioner Interfaces
// Description: Contract surfaces between the provisioner and its collaborators.
// Purpose: Define configuration, storage, engine, runner, and provider seams.
// Dependencies: crate::{core, runtime}, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces keep the orchestrator independent of any particular
//! configuration store, persistence backend, or infrastructure engine.
//! Implementations must fail closed: a missing or unreadable record is an
//! error, never an implicit default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::BindingCredentials;
use crate::core::ConfigValue;
use crate::core::DefinitionError;
use crate::core::DeprovisionDetails;
use crate::core::EngineOutcome;
use crate::core::ImportResource;
use crate::core::InstanceDetails;
use crate::core::JobId;
use crate::core::JobOperation;
use crate::core::JobRecord;
use crate::core::JobState;
use crate::core::JobStatus;
use crate::core::VarContext;
use crate::core::VarContextError;
use crate::core::Workspace;
use crate::core::WorkspaceError;
use crate::runtime::RequestContext;

// ============================================================================
// SECTION: Configuration Provider
// ============================================================================

/// Layered key-value configuration with typed get and set.
///
/// Implementations use interior mutability so a provider can be shared
/// behind an `Arc` by every resolver in the process.
pub trait ConfigProvider: Send + Sync {
    /// Returns the effective value of a key, if any layer sets it.
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// Sets (or with `None`, clears) the highest-precedence value of a key.
    fn set(&self, key: &str, value: Option<ConfigValue>);

    /// Returns the value of a key coerced to a boolean.
    ///
    /// The outer `Option` is `None` when no layer sets the key; the inner one
    /// is `None` when the value cannot be coerced.
    fn get_bool(&self, key: &str) -> Option<Option<bool>> {
        self.get(key).map(|value| value.as_bool())
    }

    /// Returns the value of a key coerced to a string.
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|value| value.as_string())
    }
}

// ============================================================================
// SECTION: Job Store
// ============================================================================

/// Job store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("job store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("job store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("job store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("job store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("job store error: {0}")]
    Store(String),
}

/// Persistence for job records.
pub trait JobStore: Send + Sync {
    /// Loads a job record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load(&self, id: &JobId) -> Result<Option<JobRecord>, StoreError>;

    /// Saves a job record, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn save(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Lists identifiers of jobs currently in a state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn ids_in_state(&self, state: JobState) -> Result<Vec<JobId>, StoreError>;
}

// ============================================================================
// SECTION: Infrastructure Engine
// ============================================================================

/// Infrastructure engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine ran and reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The engine could not be invoked.
    #[error("infrastructure engine unavailable: {0}")]
    Unavailable(String),
}

/// Declarative infrastructure engine executing workspaces.
#[async_trait]
pub trait InfraEngine: Send + Sync {
    /// Applies the workspace templates with its variables.
    async fn apply(&self, id: &JobId, workspace: &Workspace) -> Result<EngineOutcome, EngineError>;

    /// Destroys the resources tracked by the workspace state.
    async fn destroy(&self, id: &JobId, workspace: &Workspace)
    -> Result<EngineOutcome, EngineError>;

    /// Imports existing resources into the workspace state.
    async fn import(
        &self,
        id: &JobId,
        workspace: &Workspace,
        resources: &[ImportResource],
    ) -> Result<EngineOutcome, EngineError>;
}

// ============================================================================
// SECTION: Job Runner
// ============================================================================

/// Job runner errors, each carrying the job identifier.
#[derive(Debug, Error)]
pub enum JobRunnerError {
    /// No workspace is staged under the identifier.
    #[error("job {id} has not been staged")]
    NotStaged {
        /// Job identifier.
        id: JobId,
    },
    /// An action is already in flight for the identifier.
    #[error("job {id} is already running")]
    AlreadyRunning {
        /// Job identifier.
        id: JobId,
    },
    /// The operation is not allowed from the current state.
    #[error("job {id} cannot {operation} while {from}")]
    InvalidTransition {
        /// Job identifier.
        id: JobId,
        /// State the job is in.
        from: JobState,
        /// Operation that was requested.
        operation: JobOperation,
    },
    /// The job reached the failed state.
    #[error("job {id} failed: {message}")]
    JobFailed {
        /// Job identifier.
        id: JobId,
        /// Recorded failure message.
        message: String,
    },
    /// The job has no outputs to read.
    #[error("job {id} has no recorded outputs")]
    NoOutputs {
        /// Job identifier.
        id: JobId,
    },
    /// The job store failed.
    #[error("job {id}: {source}")]
    Store {
        /// Job identifier.
        id: JobId,
        /// Underlying store error.
        source: StoreError,
    },
    /// The caller's context was cancelled or timed out.
    #[error("job {id}: request cancelled before completion")]
    Cancelled {
        /// Job identifier.
        id: JobId,
    },
}

impl JobRunnerError {
    /// Returns the identifier of the job the error refers to.
    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        match self {
            Self::NotStaged { id }
            | Self::AlreadyRunning { id }
            | Self::InvalidTransition { id, .. }
            | Self::JobFailed { id, .. }
            | Self::NoOutputs { id }
            | Self::Store { id, .. }
            | Self::Cancelled { id } => id,
        }
    }
}

/// Executes and tracks asynchronous jobs keyed by identifier.
///
/// At most one engine action is in flight per identifier. Operations return
/// once the action has been scheduled; [`JobRunner::wait`] and
/// [`JobRunner::status`] observe completion.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Records a workspace under an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError::AlreadyRunning`] while the job is running.
    async fn stage_job(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        workspace: Workspace,
    ) -> Result<(), JobRunnerError>;

    /// Schedules the initial apply of a staged job.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError`] when the transition is not allowed.
    async fn create(&self, ctx: &RequestContext, id: &JobId) -> Result<(), JobRunnerError>;

    /// Merges variables into the workspace and schedules a re-apply.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError`] when the transition is not allowed.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        variables: Map<String, Value>,
    ) -> Result<(), JobRunnerError>;

    /// Schedules destruction of the job's resources.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError`] when the transition is not allowed.
    async fn destroy(&self, ctx: &RequestContext, id: &JobId) -> Result<(), JobRunnerError>;

    /// Schedules adoption of existing resources.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError`] when the transition is not allowed.
    async fn import(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        resources: Vec<ImportResource>,
    ) -> Result<(), JobRunnerError>;

    /// Blocks until the job leaves the running state.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError::JobFailed`] when the job failed and
    /// [`JobRunnerError::Cancelled`] when the context ends first.
    async fn wait(&self, ctx: &RequestContext, id: &JobId) -> Result<(), JobRunnerError>;

    /// Returns a non-blocking status snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError::JobFailed`] for failed jobs.
    async fn status(&self, ctx: &RequestContext, id: &JobId) -> Result<JobStatus, JobRunnerError>;

    /// Returns the outputs of one template instance of a succeeded job.
    ///
    /// An instance that declared no outputs yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`JobRunnerError::NoOutputs`] unless the job succeeded with
    /// recorded outputs.
    async fn outputs(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        instance_name: &str,
    ) -> Result<Map<String, Value>, JobRunnerError>;
}

// ============================================================================
// SECTION: Service Provider
// ============================================================================

/// Errors raised by service providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request variables failed validation.
    #[error("{0}")]
    VariableContext(#[from] VarContextError),
    /// A declared import variable was not supplied.
    #[error("Missing required import variable {name}")]
    MissingImportVariable {
        /// Variable name.
        name: String,
    },
    /// The workspace could not be built.
    #[error("{0}")]
    Workspace(#[from] WorkspaceError),
    /// The job runner rejected or failed the job.
    #[error("{0}")]
    JobRunner(#[from] JobRunnerError),
    /// The service definition is invalid.
    #[error("{0}")]
    InvalidDefinition(#[from] DefinitionError),
    /// Details could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Update failure that still carries the accepted operation handle.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct UpdateError {
    /// Instance details when the job identifier was known.
    pub details: Option<InstanceDetails>,
    /// Underlying failure.
    pub source: ProviderError,
}

impl UpdateError {
    /// Creates an update error without details.
    #[must_use]
    pub const fn without_details(source: ProviderError) -> Self {
        Self {
            details: None,
            source,
        }
    }
}

/// Merges instance and binding details into binding credentials.
pub trait CredentialMerger: Send + Sync {
    /// Returns the merged credentials for a binding.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the records cannot be merged.
    fn merge_credentials(
        &self,
        binding: &BindingCredentials,
        instance: &InstanceDetails,
    ) -> Result<Map<String, Value>, ProviderError>;
}

/// Broker lifecycle verbs implemented by each provider variant.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Starts provisioning an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the operation cannot be issued.
    async fn provision(
        &self,
        ctx: &RequestContext,
        vars: &VarContext,
    ) -> Result<InstanceDetails, ProviderError>;

    /// Starts updating an instance.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`], with details whenever the job is known.
    async fn update(&self, ctx: &RequestContext, vars: &VarContext) -> Result<InstanceDetails, UpdateError>;

    /// Creates a binding and returns its outputs once complete.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the binding job fails.
    async fn bind(
        &self,
        ctx: &RequestContext,
        vars: &VarContext,
    ) -> Result<Map<String, Value>, ProviderError>;

    /// Removes a binding and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the destroy job fails.
    async fn unbind(
        &self,
        ctx: &RequestContext,
        instance: &InstanceDetails,
        binding: &BindingCredentials,
    ) -> Result<(), ProviderError>;

    /// Starts deprovisioning and returns the operation identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the destroy cannot be issued.
    async fn deprovision(
        &self,
        ctx: &RequestContext,
        instance: &InstanceDetails,
        details: &DeprovisionDetails,
    ) -> Result<Option<String>, ProviderError>;

    /// Returns the status of the instance's job.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the status cannot be read or the job failed.
    async fn poll_instance(
        &self,
        ctx: &RequestContext,
        instance: &InstanceDetails,
    ) -> Result<JobStatus, ProviderError>;

    /// Returns true when provision results must be polled.
    fn provisions_async(&self) -> bool;

    /// Returns true when deprovision results must be polled.
    fn deprovisions_async(&self) -> bool;

    /// Refreshes the instance's other details from its job outputs.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when outputs cannot be read.
    async fn update_instance_details(
        &self,
        ctx: &RequestContext,
        instance: &mut InstanceDetails,
    ) -> Result<(), ProviderError>;

    /// Builds the credentials returned for a binding.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the records cannot be merged.
    fn build_instance_credentials(
        &self,
        binding: &BindingCredentials,
        instance: &InstanceDetails,
    ) -> Result<Map<String, Value>, ProviderError>;
}
