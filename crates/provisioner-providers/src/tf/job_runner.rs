// crates/provisioner-providers/src/tf/job_runner.rs
// ============================================================================
// Module: Terraform Job Runner
// Description: Job state machine driving an infrastructure engine.
// Purpose: Run at most one engine action per job id and persist every transition.
// Dependencies: provisioner-core, async-trait, tokio, tracing
// ============================================================================

//! ## Overview
//! [`TfJobRunner`] stages workspaces into a [`JobStore`] and runs engine
//! actions in background tasks. Every operation first moves the record to
//! `Running` under the transition lock and persists it, then spawns the
//! engine call. The task records `Succeeded` or `Failed` when the engine
//! returns. Allowed transitions:
//!
//! | Operation | From |
//! |---|---|
//! | create, import | staged |
//! | update, destroy | succeeded |
//!
//! Waits poll the store with capped exponential backoff and give up when the
//! caller's context ends, leaving the job untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use provisioner_core::ImportResource;
use provisioner_core::InfraEngine;
use provisioner_core::JobId;
use provisioner_core::JobOperation;
use provisioner_core::JobRecord;
use provisioner_core::JobRunner;
use provisioner_core::JobRunnerError;
use provisioner_core::JobState;
use provisioner_core::JobStatus;
use provisioner_core::JobStore;
use provisioner_core::PollPolicy;
use provisioner_core::RequestContext;
use provisioner_core::StoreError;
use provisioner_core::Workspace;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::error;
use tracing::warn;

// ============================================================================
// SECTION: Job Runner
// ============================================================================

/// Job runner backed by an infrastructure engine and a job store.
#[derive(Clone)]
pub struct TfJobRunner {
    engine: Arc<dyn InfraEngine>,
    store: Arc<dyn JobStore>,
    policy: PollPolicy,
    transitions: Arc<Mutex<()>>,
}

impl fmt::Debug for TfJobRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfJobRunner").field("policy", &self.policy).finish_non_exhaustive()
    }
}

/// Engine call scheduled by a transition.
enum EngineAction {
    /// Apply templates with the workspace variables.
    Apply,
    /// Destroy managed resources.
    Destroy,
    /// Adopt the listed resources.
    Import(Vec<ImportResource>),
}

impl TfJobRunner {
    /// Creates a runner with the default poll policy.
    #[must_use]
    pub fn new(engine: Arc<dyn InfraEngine>, store: Arc<dyn JobStore>) -> Self {
        Self::with_policy(engine, store, PollPolicy::default())
    }

    /// Creates a runner with an explicit poll policy.
    #[must_use]
    pub fn with_policy(engine: Arc<dyn InfraEngine>, store: Arc<dyn JobStore>, policy: PollPolicy) -> Self {
        Self { engine, store, policy, transitions: Arc::new(Mutex::new(())) }
    }

    /// Returns the poll policy used by [`JobRunner::wait`].
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Marks jobs persisted as running as failed.
    ///
    /// Call once at startup, before serving requests: a record left running
    /// by a previous process has no live task to complete it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be queried or updated.
    pub fn recover_interrupted(&self) -> Result<Vec<JobId>, StoreError> {
        let _guard = self.transitions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut recovered = Vec::new();
        for id in self.store.ids_in_state(JobState::Running)? {
            let Some(mut record) = self.store.load(&id)? else {
                continue;
            };
            if record.state != JobState::Running {
                continue;
            }
            let operation = record.operation.map_or("job", JobOperation::as_str);
            record.state = JobState::Failed;
            record.last_error = Some(format!("interrupted: broker restarted while {operation} was running"));
            record.updated_at_ms = unix_millis();
            self.store.save(&record)?;
            warn!(tf_id = %id, operation, "marked interrupted job as failed");
            recovered.push(id);
        }
        Ok(recovered)
    }

    /// Loads a record, failing when nothing is staged under the id.
    fn load_existing(&self, id: &JobId) -> Result<JobRecord, JobRunnerError> {
        self.store
            .load(id)
            .map_err(|source| JobRunnerError::Store { id: id.clone(), source })?
            .ok_or_else(|| JobRunnerError::NotStaged { id: id.clone() })
    }

    /// Moves a job to running and spawns its engine action.
    fn begin(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        operation: JobOperation,
        variables: Option<&Map<String, Value>>,
        action: EngineAction,
    ) -> Result<(), JobRunnerError> {
        if ctx.is_cancelled() {
            return Err(JobRunnerError::Cancelled { id: id.clone() });
        }
        let record = {
            let _guard = self.transitions.lock().unwrap_or_else(PoisonError::into_inner);
            let mut record = self.load_existing(id)?;
            match record.state {
                JobState::Running => return Err(JobRunnerError::AlreadyRunning { id: id.clone() }),
                state if state != required_state(operation) => {
                    return Err(JobRunnerError::InvalidTransition { id: id.clone(), from: state, operation });
                }
                _ => {}
            }
            if let Some(variables) = variables {
                record.workspace.merge_variables(variables);
            }
            record.state = JobState::Running;
            record.operation = Some(operation);
            record.last_error = None;
            record.updated_at_ms = unix_millis();
            self.store.save(&record).map_err(|source| JobRunnerError::Store { id: id.clone(), source })?;
            record
        };
        debug!(tf_id = %id, operation = %operation, "job running");
        tokio::spawn(run_action(Arc::clone(&self.engine), Arc::clone(&self.store), record, action));
        Ok(())
    }
}

/// Returns the state an operation must start from.
const fn required_state(operation: JobOperation) -> JobState {
    match operation {
        JobOperation::Create | JobOperation::Import => JobState::Staged,
        JobOperation::Update | JobOperation::Destroy => JobState::Succeeded,
    }
}

/// Runs one engine action and records its terminal state.
async fn run_action(
    engine: Arc<dyn InfraEngine>,
    store: Arc<dyn JobStore>,
    mut record: JobRecord,
    action: EngineAction,
) {
    let result = match &action {
        EngineAction::Apply => engine.apply(&record.id, &record.workspace).await,
        EngineAction::Destroy => engine.destroy(&record.id, &record.workspace).await,
        EngineAction::Import(resources) => engine.import(&record.id, &record.workspace, resources).await,
    };
    let operation = record.operation.map_or("job", JobOperation::as_str);
    match result {
        Ok(outcome) => {
            record.state = JobState::Succeeded;
            record.workspace.state = outcome.state;
            record.outputs = match action {
                EngineAction::Destroy => None,
                EngineAction::Apply | EngineAction::Import(_) => Some(outcome.outputs),
            };
            debug!(tf_id = %record.id, operation, "job succeeded");
        }
        Err(err) => {
            record.state = JobState::Failed;
            record.last_error = Some(err.to_string());
            warn!(tf_id = %record.id, operation, error = %err, "job failed");
        }
    }
    record.updated_at_ms = unix_millis();
    if let Err(err) = store.save(&record) {
        error!(tf_id = %record.id, operation, error = %err, "failed to persist job outcome");
    }
}

/// Returns the current Unix time in milliseconds.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// SECTION: Job Runner Interface
// ============================================================================

#[async_trait]
impl JobRunner for TfJobRunner {
    async fn stage_job(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        workspace: Workspace,
    ) -> Result<(), JobRunnerError> {
        if ctx.is_cancelled() {
            return Err(JobRunnerError::Cancelled { id: id.clone() });
        }
        {
            let _guard = self.transitions.lock().unwrap_or_else(PoisonError::into_inner);
            let existing =
                self.store.load(id).map_err(|source| JobRunnerError::Store { id: id.clone(), source })?;
            if existing.is_some_and(|record| record.state == JobState::Running) {
                return Err(JobRunnerError::AlreadyRunning { id: id.clone() });
            }
            let record = JobRecord::staged(id.clone(), workspace, unix_millis());
            self.store.save(&record).map_err(|source| JobRunnerError::Store { id: id.clone(), source })?;
        }
        debug!(tf_id = %id, "job staged");
        Ok(())
    }

    async fn create(&self, ctx: &RequestContext, id: &JobId) -> Result<(), JobRunnerError> {
        self.begin(ctx, id, JobOperation::Create, None, EngineAction::Apply)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        variables: Map<String, Value>,
    ) -> Result<(), JobRunnerError> {
        self.begin(ctx, id, JobOperation::Update, Some(&variables), EngineAction::Apply)
    }

    async fn destroy(&self, ctx: &RequestContext, id: &JobId) -> Result<(), JobRunnerError> {
        self.begin(ctx, id, JobOperation::Destroy, None, EngineAction::Destroy)
    }

    async fn import(
        &self,
        ctx: &RequestContext,
        id: &JobId,
        resources: Vec<ImportResource>,
    ) -> Result<(), JobRunnerError> {
        self.begin(ctx, id, JobOperation::Import, None, EngineAction::Import(resources))
    }

    async fn wait(&self, ctx: &RequestContext, id: &JobId) -> Result<(), JobRunnerError> {
        let mut delays = self.policy.backoff();
        loop {
            let record = self.load_existing(id)?;
            match record.state {
                JobState::Running => {}
                JobState::Failed => {
                    return Err(JobRunnerError::JobFailed {
                        id: id.clone(),
                        message: record.last_error.unwrap_or_default(),
                    });
                }
                JobState::Staged | JobState::Succeeded => return Ok(()),
            }
            let delay = delays.next().unwrap_or(self.policy.max);
            tokio::select! {
                () = ctx.cancelled() => {
                    debug!(tf_id = %id, "wait abandoned by caller");
                    return Err(JobRunnerError::Cancelled { id: id.clone() });
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn status(&self, _ctx: &RequestContext, id: &JobId) -> Result<JobStatus, JobRunnerError> {
        let record = self.load_existing(id)?;
        if record.state == JobState::Failed {
            return Err(JobRunnerError::JobFailed { id: id.clone(), message: record.last_error.unwrap_or_default() });
        }
        Ok(record.status())
    }

    /// `NoOutputs` means nothing was recorded; a missing namespace is empty.
    async fn outputs(
        &self,
        _ctx: &RequestContext,
        id: &JobId,
        instance_name: &str,
    ) -> Result<Map<String, Value>, JobRunnerError> {
        let record = self.load_existing(id)?;
        match (record.state, record.outputs) {
            (JobState::Succeeded, Some(outputs)) => Ok(outputs.get(instance_name).cloned().unwrap_or_default()),
            _ => Err(JobRunnerError::NoOutputs { id: id.clone() }),
        }
    }
}
