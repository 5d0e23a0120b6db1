// crates/provisioner-core/src/runtime/memory.rs
// ============================================================================
// Module: Provisioner In-Memory Collaborators
// Description: In-memory configuration provider and job store.
// Purpose: Provide isolated, dependency-free collaborators for tests and demos.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! These implementations keep everything in process memory. Each instance
//! is isolated, so tests never share configuration through global state.
//! They are not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::core::ConfigValue;
use crate::core::JobId;
use crate::core::JobRecord;
use crate::core::JobState;
use crate::interfaces::ConfigProvider;
use crate::interfaces::JobStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Config Provider
// ============================================================================

/// Single-layer in-memory configuration provider.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConfigProvider {
    /// Values keyed by property name.
    values: Arc<RwLock<BTreeMap<String, ConfigValue>>>,
}

impl InMemoryConfigProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider seeded with values.
    #[must_use]
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        let values = values.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }
}

impl ConfigProvider for InMemoryConfigProvider {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: Option<ConfigValue>) {
        let mut guard = self.values.write().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                guard.insert(key.to_string(), value);
            }
            None => {
                guard.remove(key);
            }
        }
    }
}

// ============================================================================
// SECTION: Job Store
// ============================================================================

/// In-memory job store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    /// Job records protected by a mutex.
    jobs: Arc<Mutex<BTreeMap<JobId, JobRecord>>>,
}

impl InMemoryJobStore {
    /// Creates an empty job store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn load(&self, id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        let guard = self
            .jobs
            .lock()
            .map_err(|_| StoreError::Store("job store mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    fn save(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.jobs
            .lock()
            .map_err(|_| StoreError::Store("job store mutex poisoned".to_string()))?
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn ids_in_state(&self, state: JobState) -> Result<Vec<JobId>, StoreError> {
        let guard = self
            .jobs
            .lock()
            .map_err(|_| StoreError::Store("job store mutex poisoned".to_string()))?;
        Ok(guard.values().filter(|record| record.state == state).map(|record| record.id.clone()).collect())
    }
}
