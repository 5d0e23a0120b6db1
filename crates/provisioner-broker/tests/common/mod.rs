// crates/provisioner-broker/tests/common/mod.rs
// ============================================================================
// Module: Broker Test Helpers
// Description: Shared fixtures for catalog resolution tests.
// Purpose: Give each test an isolated configuration provider.
// Dependencies: provisioner-broker, provisioner-core, async-trait
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;

use async_trait::async_trait;
use provisioner_broker::BrokerService;
use provisioner_core::BindingCredentials;
use provisioner_core::ConfigProvider;
use provisioner_core::ConfigValue;
use provisioner_core::DeprovisionDetails;
use provisioner_core::InMemoryConfigProvider;
use provisioner_core::InstanceDetails;
use provisioner_core::JobState;
use provisioner_core::JobStatus;
use provisioner_core::ProviderError;
use provisioner_core::RequestContext;
use provisioner_core::ServiceProvider;
use provisioner_core::UpdateError;
use provisioner_core::VarContext;
use serde_json::Map;
use serde_json::Value;

pub type TestResult = Result<(), String>;

pub const SERVICE_NAME: &str = "left-handed-smoke-sifter";
pub const DEFAULT_DEFINITION: &str = r#"{"id":"abcd-efgh-ijkl"}"#;

/// Builds a service backed by a fresh in-memory config provider.
pub fn service_with(default_definition: &str) -> (BrokerService, Arc<InMemoryConfigProvider>) {
    let config = Arc::new(InMemoryConfigProvider::new());
    let provider: Arc<dyn ConfigProvider> = config.clone();
    (BrokerService::new(SERVICE_NAME, default_definition, provider), config)
}

/// Sets or clears a string property.
pub fn set_str(config: &InMemoryConfigProvider, key: &str, value: Option<&str>) {
    config.set(key, value.map(ConfigValue::from));
}

/// Provider that is never driven by catalog tests.
#[derive(Debug, Default)]
pub struct IdleProvider;

#[async_trait]
impl ServiceProvider for IdleProvider {
    async fn provision(&self, _ctx: &RequestContext, _vars: &VarContext) -> Result<InstanceDetails, ProviderError> {
        Ok(InstanceDetails::default())
    }

    async fn update(&self, _ctx: &RequestContext, _vars: &VarContext) -> Result<InstanceDetails, UpdateError> {
        Ok(InstanceDetails::default())
    }

    async fn bind(&self, _ctx: &RequestContext, _vars: &VarContext) -> Result<Map<String, Value>, ProviderError> {
        Ok(Map::new())
    }

    async fn unbind(
        &self,
        _ctx: &RequestContext,
        _instance: &InstanceDetails,
        _binding: &BindingCredentials,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn deprovision(
        &self,
        _ctx: &RequestContext,
        _instance: &InstanceDetails,
        _details: &DeprovisionDetails,
    ) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    async fn poll_instance(
        &self,
        _ctx: &RequestContext,
        _instance: &InstanceDetails,
    ) -> Result<JobStatus, ProviderError> {
        Ok(JobStatus { state: JobState::Staged, done: false, description: "staged".to_string() })
    }

    fn provisions_async(&self) -> bool {
        false
    }

    fn deprovisions_async(&self) -> bool {
        false
    }

    async fn update_instance_details(
        &self,
        _ctx: &RequestContext,
        _instance: &mut InstanceDetails,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn build_instance_credentials(
        &self,
        _binding: &BindingCredentials,
        _instance: &InstanceDetails,
    ) -> Result<Map<String, Value>, ProviderError> {
        Ok(Map::new())
    }
}
