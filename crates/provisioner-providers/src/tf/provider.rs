// crates/provisioner-providers/src/tf/provider.rs
// ============================================================================
// Module: Terraform Provider
// Description: Broker lifecycle verbs realized as staged engine jobs.
// Purpose: Own job identifiers and the sync/async shape of each verb.
// Dependencies: provisioner-core, async-trait, tracing
// ============================================================================

//! ## Overview
//! Provision, update and deprovision return once the job runner has accepted
//! the operation; completion is observed through `poll_instance`. Bind and
//! unbind wait for the job to reach a terminal state before returning. The
//! provider holds no locks: serialization per job id is the runner's job.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use provisioner_core::ActionDefinition;
use provisioner_core::BindingCredentials;
use provisioner_core::CredentialMerger;
use provisioner_core::DEFAULT_INSTANCE_NAME;
use provisioner_core::DeprovisionDetails;
use provisioner_core::ImportResource;
use provisioner_core::InstanceDetails;
use provisioner_core::JobId;
use provisioner_core::JobRunner;
use provisioner_core::JobStatus;
use provisioner_core::OperationType;
use provisioner_core::ProviderError;
use provisioner_core::RequestContext;
use provisioner_core::ServiceProvider;
use provisioner_core::UpdateError;
use provisioner_core::VarContext;
use provisioner_core::Workspace;
use serde_json::Map;
use serde_json::Value;
use tracing::error;
use tracing::info;

use crate::base::MergedInstanceCredentials;
use crate::tf::definition::TfServiceDefinition;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Variable carrying the job identifier of the request.
pub const TF_ID_VARIABLE: &str = "tf_id";

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Service provider backed by infrastructure templates.
#[derive(Clone)]
pub struct TerraformProvider {
    definition: TfServiceDefinition,
    job_runner: Arc<dyn JobRunner>,
    credentials: Arc<dyn CredentialMerger>,
}

impl fmt::Debug for TerraformProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerraformProvider").field("service", &self.definition.name).finish_non_exhaustive()
    }
}

impl TerraformProvider {
    /// Creates a provider for a validated service definition.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidDefinition`] when the definition is
    /// invalid.
    pub fn new(definition: TfServiceDefinition, job_runner: Arc<dyn JobRunner>) -> Result<Self, ProviderError> {
        definition.validate()?;
        Ok(Self { definition, job_runner, credentials: Arc::new(MergedInstanceCredentials) })
    }

    /// Replaces the credential merging capability.
    #[must_use]
    pub fn with_credential_merger(mut self, credentials: Arc<dyn CredentialMerger>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Returns the service definition.
    #[must_use]
    pub const fn definition(&self) -> &TfServiceDefinition {
        &self.definition
    }

    /// Stages a plain workspace from `action` and issues create.
    async fn create(
        &self,
        ctx: &RequestContext,
        vars: &VarContext,
        action: &ActionDefinition,
    ) -> Result<JobId, ProviderError> {
        let tf_id = read_tf_id(vars)?;
        let workspace = Workspace::new(vars.to_map(), &action.template, BTreeMap::new(), Vec::new(), Vec::new())?;
        self.stage(ctx, &tf_id, workspace).await?;
        self.job_runner.create(ctx, &tf_id).await?;
        Ok(tf_id)
    }

    /// Stages an import workspace from `action` and issues import.
    async fn import_create(
        &self,
        ctx: &RequestContext,
        vars: &VarContext,
        action: &ActionDefinition,
    ) -> Result<JobId, ProviderError> {
        let tf_id = read_tf_id(vars)?;
        let variables = vars.to_map();
        let workspace = Workspace::new(
            variables.clone(),
            "",
            action.templates.clone(),
            action.import_parameter_mappings.clone(),
            action.import_parameters_to_delete.clone(),
        )?;
        self.stage(ctx, &tf_id, workspace).await?;

        let resources = action
            .import_variables
            .iter()
            .map(|variable| {
                variables
                    .get(&variable.name)
                    .map(|value| ImportResource {
                        tf_resource: variable.tf_resource.clone(),
                        iaas_resource: resource_id(value),
                    })
                    .ok_or_else(|| ProviderError::MissingImportVariable { name: variable.name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.job_runner.import(ctx, &tf_id, resources).await?;
        Ok(tf_id)
    }

    /// Stages a workspace, logging failures before they cross the async boundary.
    async fn stage(&self, ctx: &RequestContext, tf_id: &JobId, workspace: Workspace) -> Result<(), ProviderError> {
        self.job_runner.stage_job(ctx, tf_id, workspace).await.map_err(|err| {
            error!(service = %self.definition.name, tf_id = %tf_id, error = %err, "terraform provider create failed");
            ProviderError::from(err)
        })
    }
}

/// Reads the job identifier and checks the variable context.
fn read_tf_id(vars: &VarContext) -> Result<JobId, ProviderError> {
    let mut reader = vars.reader();
    let tf_id = reader.non_empty_string(TF_ID_VARIABLE);
    reader.finish()?;
    Ok(JobId::new(tf_id))
}

/// Returns the external identifier of an imported resource.
fn resource_id(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Service Provider Interface
// ============================================================================

#[async_trait]
impl ServiceProvider for TerraformProvider {
    async fn provision(&self, ctx: &RequestContext, vars: &VarContext) -> Result<InstanceDetails, ProviderError> {
        info!(service = %self.definition.name, context = ?vars.as_map(), "provision");
        let action = &self.definition.provision_settings;
        let tf_id = if action.is_import() {
            self.import_create(ctx, vars, action).await?
        } else {
            self.create(ctx, vars, action).await?
        };
        Ok(InstanceDetails::for_operation(&tf_id, OperationType::Provision))
    }

    async fn update(&self, ctx: &RequestContext, vars: &VarContext) -> Result<InstanceDetails, UpdateError> {
        info!(service = %self.definition.name, context = ?vars.as_map(), "update");
        let tf_id = read_tf_id(vars).map_err(UpdateError::without_details)?;
        let details = InstanceDetails::for_operation(&tf_id, OperationType::Update);
        match self.job_runner.update(ctx, &tf_id, vars.to_map()).await {
            Ok(()) => Ok(details),
            Err(err) => Err(UpdateError { details: Some(details), source: err.into() }),
        }
    }

    async fn bind(&self, ctx: &RequestContext, vars: &VarContext) -> Result<Map<String, Value>, ProviderError> {
        info!(service = %self.definition.name, context = ?vars.as_map(), "bind");
        let tf_id = self.create(ctx, vars, &self.definition.bind_settings).await?;
        self.job_runner.wait(ctx, &tf_id).await?;
        Ok(self.job_runner.outputs(ctx, &tf_id, DEFAULT_INSTANCE_NAME).await?)
    }

    async fn unbind(
        &self,
        ctx: &RequestContext,
        instance: &InstanceDetails,
        binding: &BindingCredentials,
    ) -> Result<(), ProviderError> {
        let tf_id = JobId::for_binding(&instance.id, &binding.binding_id);
        info!(
            service = %self.definition.name,
            instance_id = %instance.id,
            binding_id = %binding.binding_id,
            tf_id = %tf_id,
            "unbind"
        );
        self.job_runner.destroy(ctx, &tf_id).await?;
        self.job_runner.wait(ctx, &tf_id).await?;
        Ok(())
    }

    async fn deprovision(
        &self,
        ctx: &RequestContext,
        instance: &InstanceDetails,
        _details: &DeprovisionDetails,
    ) -> Result<Option<String>, ProviderError> {
        info!(service = %self.definition.name, instance_id = %instance.id, "deprovision");
        let tf_id = JobId::for_instance(&instance.id);
        self.job_runner.destroy(ctx, &tf_id).await?;
        Ok(Some(tf_id.as_str().to_string()))
    }

    async fn poll_instance(
        &self,
        ctx: &RequestContext,
        instance: &InstanceDetails,
    ) -> Result<JobStatus, ProviderError> {
        Ok(self.job_runner.status(ctx, &JobId::for_instance(&instance.id)).await?)
    }

    fn provisions_async(&self) -> bool {
        true
    }

    fn deprovisions_async(&self) -> bool {
        true
    }

    async fn update_instance_details(
        &self,
        ctx: &RequestContext,
        instance: &mut InstanceDetails,
    ) -> Result<(), ProviderError> {
        let tf_id = JobId::for_instance(&instance.id);
        let outputs = self.job_runner.outputs(ctx, &tf_id, DEFAULT_INSTANCE_NAME).await?;
        instance.set_other_details(&outputs).map_err(|err| ProviderError::Serialization(err.to_string()))
    }

    fn build_instance_credentials(
        &self,
        binding: &BindingCredentials,
        instance: &InstanceDetails,
    ) -> Result<Map<String, Value>, ProviderError> {
        self.credentials.merge_credentials(binding, instance)
    }
}
