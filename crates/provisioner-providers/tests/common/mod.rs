// crates/provisioner-providers/tests/common/mod.rs
// ============================================================================
// Module: Provider Test Helpers
// Description: Scripted infrastructure engine and job fixtures.
// Purpose: Drive the job runner and provider without a real engine.
// Dependencies: provisioner-core, provisioner-providers, tokio
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use provisioner_core::EngineError;
use provisioner_core::EngineOutcome;
use provisioner_core::ImportResource;
use provisioner_core::InMemoryJobStore;
use provisioner_core::InfraEngine;
use provisioner_core::JobId;
use provisioner_core::JobState;
use provisioner_core::JobStore;
use provisioner_core::Outputs;
use provisioner_core::PollPolicy;
use provisioner_core::VarContext;
use provisioner_core::VarContextBuilder;
use provisioner_core::Workspace;
use provisioner_providers::TfJobRunner;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::watch;

pub type TestResult = Result<(), String>;

/// One recorded engine invocation.
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub kind: &'static str,
    pub id: JobId,
    pub variables: Map<String, Value>,
    pub resources: Vec<ImportResource>,
}

/// Engine whose results are scripted per call.
///
/// Unscripted calls succeed with the default outputs. While held, every
/// call blocks until [`ScriptedEngine::release`] is called.
pub struct ScriptedEngine {
    results: Mutex<VecDeque<Result<Outputs, EngineError>>>,
    default_outputs: Mutex<Outputs>,
    calls: Mutex<Vec<EngineCall>>,
    released: watch::Sender<bool>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            default_outputs: Mutex::new(Outputs::new()),
            calls: Mutex::new(Vec::new()),
            released: watch::Sender::new(true),
        }
    }
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sets the outputs returned by unscripted successful calls.
    pub fn set_outputs(&self, instance: &str, outputs: Value) {
        let map = match outputs {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.default_outputs.lock().unwrap().insert(instance.to_string(), map);
    }

    /// Queues a failure for the next call.
    pub fn fail_next(&self, message: &str) {
        self.results.lock().unwrap().push_back(Err(EngineError::Failed(message.to_string())));
    }

    /// Blocks subsequent calls until released.
    pub fn hold(&self) {
        self.released.send_replace(false);
    }

    /// Lets blocked calls complete.
    pub fn release(&self) {
        self.released.send_replace(true);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_kinds(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|call| call.kind).collect()
    }

    async fn run(
        &self,
        kind: &'static str,
        id: &JobId,
        workspace: &Workspace,
        resources: &[ImportResource],
    ) -> Result<EngineOutcome, EngineError> {
        self.calls.lock().unwrap().push(EngineCall {
            kind,
            id: id.clone(),
            variables: workspace.variables.clone(),
            resources: resources.to_vec(),
        });
        let mut released = self.released.subscribe();
        let _ = released.wait_for(|released| *released).await;
        let scripted = self.results.lock().unwrap().pop_front();
        let outputs = match scripted {
            Some(result) => result?,
            None => self.default_outputs.lock().unwrap().clone(),
        };
        Ok(EngineOutcome { state: Some(serde_json::json!({"serial": 1, "last": kind})), outputs })
    }
}

#[async_trait]
impl InfraEngine for ScriptedEngine {
    async fn apply(&self, id: &JobId, workspace: &Workspace) -> Result<EngineOutcome, EngineError> {
        self.run("apply", id, workspace, &[]).await
    }

    async fn destroy(&self, id: &JobId, workspace: &Workspace) -> Result<EngineOutcome, EngineError> {
        self.run("destroy", id, workspace, &[]).await
    }

    async fn import(
        &self,
        id: &JobId,
        workspace: &Workspace,
        resources: &[ImportResource],
    ) -> Result<EngineOutcome, EngineError> {
        self.run("import", id, workspace, resources).await
    }
}

/// Poll policy short enough for tests running on real time.
pub fn fast_policy() -> PollPolicy {
    PollPolicy { initial: Duration::from_millis(1), max: Duration::from_millis(10), multiplier: 2 }
}

/// Builds a runner over a scripted engine and an in-memory store.
pub fn runner() -> (TfJobRunner, Arc<ScriptedEngine>, Arc<InMemoryJobStore>) {
    let engine = ScriptedEngine::new();
    let store = Arc::new(InMemoryJobStore::new());
    let runner = TfJobRunner::with_policy(engine.clone(), store.clone(), fast_policy());
    (runner, engine, store)
}

/// Builds a plain workspace holding `variables`.
pub fn workspace(variables: Value) -> Workspace {
    let map = match variables {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Workspace::new(map, "resource {}", std::collections::BTreeMap::new(), Vec::new(), Vec::new()).unwrap()
}

/// Builds a variable context from a JSON object.
pub fn vars(values: Value) -> VarContext {
    let map = match values {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    VarContextBuilder::new().merge_map(&map).build().unwrap()
}

/// Polls the store until the job reaches `state`.
pub async fn wait_for_state(store: &InMemoryJobStore, id: &JobId, state: JobState) -> TestResult {
    for _ in 0..500 {
        if store.load(id).map_err(|err| err.to_string())?.map(|record| record.state) == Some(state) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    Err(format!("job {id} never reached {state}"))
}
