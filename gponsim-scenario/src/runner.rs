//! Scenario execution engine
//!
//! Each started scenario becomes an independent tokio task driving its
//! steps in order: wait the step delay, dispatch the action, append the
//! result. Runs are keyed by scenario id; starting an id that already has
//! an active run is rejected with `AlreadyRunning` rather than silently
//! replacing the prior run record. Stopping cancels at the next suspension
//! point; an in-flight handler finishes before the run transitions.

use crate::action::{Action, ActionDispatcher};
use crate::catalog::{AttackScenario, ScenarioCatalog};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gponsim_core::{DeviceDirectory, Error, Result};
use gponsim_protocols::ProtocolEngine;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle state of a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Completed,
    Stopped,
}

/// Recorded outcome of one executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: u32,
    pub action: String,
    pub result: Value,
    pub timestamp: DateTime<Utc>,
}

/// Mutable record of one scenario run
///
/// Mutated only by the run's own task; `current_step` is monotone and
/// never exceeds the template's step count, and a terminal state never
/// reverts.
#[derive(Debug, Clone, Serialize)]
pub struct RunningScenario {
    pub scenario: AttackScenario,
    pub start_time: DateTime<Utc>,
    pub current_step: u32,
    pub state: RunState,
    pub results: Vec<StepResult>,
}

impl RunningScenario {
    fn new(scenario: AttackScenario) -> Self {
        Self {
            scenario,
            start_time: Utc::now(),
            current_step: 0,
            state: RunState::Running,
            results: Vec::new(),
        }
    }

    pub fn completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

/// Handle to a launched scenario run
#[derive(Debug)]
pub struct RunHandle {
    /// Unique run-instance id (UUID v7 for time-ordered tracking)
    pub run_id: Uuid,
    pub scenario_id: String,
    record: Arc<RwLock<RunningScenario>>,
    running: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RunHandle {
    /// Snapshot of the run record
    pub fn status(&self) -> RunningScenario {
        self.record.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request cancellation at the next suspension point
    ///
    /// `notify_one` stores a permit, so the request is not lost even when
    /// the run task has not reached its first suspension point yet.
    fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.cancel.notify_one();
    }
}

/// Manages the catalog and all scenario runs
pub struct ScenarioRunner {
    catalog: ScenarioCatalog,
    dispatcher: Arc<ActionDispatcher>,
    /// Active and retained runs, keyed by scenario id
    runs: DashMap<String, Arc<RunHandle>>,
}

impl ScenarioRunner {
    /// Create a runner over the built-in catalog
    pub fn new(engine: Arc<ProtocolEngine>, directory: Arc<DeviceDirectory>) -> Self {
        Self::with_catalog(ScenarioCatalog::builtin(), engine, directory)
    }

    /// Create a runner over an explicit catalog
    pub fn with_catalog(
        catalog: ScenarioCatalog,
        engine: Arc<ProtocolEngine>,
        directory: Arc<DeviceDirectory>,
    ) -> Self {
        info!(scenarios = catalog.len(), "Creating scenario runner");
        Self {
            catalog,
            dispatcher: Arc::new(ActionDispatcher::new(engine, directory)),
            runs: DashMap::new(),
        }
    }

    /// List all scenario templates
    pub fn list_scenarios(&self) -> Vec<AttackScenario> {
        self.catalog.list()
    }

    /// Get one scenario template
    pub fn get_scenario(&self, id: &str) -> Option<AttackScenario> {
        self.catalog.get(id).cloned()
    }

    /// Start a scenario run
    ///
    /// Returns immediately with the run handle; execution happens on a
    /// spawned task. Fails with `NotFound` for unknown ids and with
    /// `AlreadyRunning` while a previous run of the same scenario is
    /// still active (completed or stopped runs are superseded).
    pub fn start(&self, scenario_id: &str) -> Result<Arc<RunHandle>> {
        let scenario = self
            .catalog
            .get(scenario_id)
            .ok_or_else(|| Error::not_found(format!("Scenario {scenario_id} not found")))?
            .clone();

        if let Some(existing) = self.runs.get(scenario_id) {
            if existing.is_running() {
                warn!(scenario = %scenario_id, "Rejecting start: run already active");
                return Err(Error::AlreadyRunning(scenario_id.to_string()));
            }
        }

        let record = Arc::new(RwLock::new(RunningScenario::new(scenario.clone())));
        let running = Arc::new(AtomicBool::new(true));
        let cancel = Arc::new(Notify::new());
        let run_id = Uuid::now_v7();

        info!(
            run_id = %run_id,
            scenario = %scenario_id,
            steps = scenario.steps.len(),
            "Starting scenario run"
        );

        let task = tokio::spawn(execute_run(
            scenario,
            self.dispatcher.clone(),
            record.clone(),
            running.clone(),
            cancel.clone(),
        ));

        let handle = Arc::new(RunHandle {
            run_id,
            scenario_id: scenario_id.to_string(),
            record,
            running,
            cancel,
            task: Mutex::new(Some(task)),
        });

        self.runs.insert(scenario_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Current record of a scenario's latest run
    pub fn status(&self, scenario_id: &str) -> Option<RunningScenario> {
        self.runs.get(scenario_id).map(|h| h.status())
    }

    /// Records of every run still in `Running` state
    pub fn running_scenarios(&self) -> Vec<RunningScenario> {
        self.runs
            .iter()
            .filter(|entry| entry.value().is_running())
            .map(|entry| entry.value().status())
            .collect()
    }

    /// Stop a run at its next suspension point
    ///
    /// Safe to call at any time; an in-flight handler finishes first and
    /// partially recorded results are retained. Stopping an already
    /// finished run is a no-op.
    pub async fn stop(&self, scenario_id: &str) -> Result<()> {
        let handle = self
            .runs
            .get(scenario_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(format!("Scenario {scenario_id} has no run")))?;

        info!(run_id = %handle.run_id, scenario = %scenario_id, "Stopping scenario run");
        handle.request_stop();

        let task = handle.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|e| Error::ExecutionFailed(format!("Failed to join run task: {e}")))?;
        }
        Ok(())
    }

    /// Stop every active run
    pub async fn stop_all(&self) -> Result<()> {
        let ids: Vec<String> = self.runs.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.stop(&id).await?;
        }
        Ok(())
    }
}

/// Drive one run to completion, recording per-step results
async fn execute_run(
    scenario: AttackScenario,
    dispatcher: Arc<ActionDispatcher>,
    record: Arc<RwLock<RunningScenario>>,
    running: Arc<AtomicBool>,
    cancel: Arc<Notify>,
) {
    for step in &scenario.steps {
        if step.delay_seconds > 0 && running.load(Ordering::Relaxed) {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(step.delay_seconds)) => {}
                _ = cancel.notified() => {}
            }
        }

        if !running.load(Ordering::Relaxed) {
            record.write().state = RunState::Stopped;
            info!(scenario = %scenario.id, step = step.step_number, "Run stopped");
            return;
        }

        record.write().current_step = step.step_number;

        // Unknown action names do not abort the run; they are recorded
        // as a failed result and the run proceeds.
        let result = match Action::from_name(&step.action) {
            Some(action) => dispatcher.dispatch(action, &step.parameters).await,
            None => {
                warn!(scenario = %scenario.id, action = %step.action, "Unknown action");
                json!({ "success": false, "error": "unknown_action", "action": step.action })
            }
        };

        debug!(
            scenario = %scenario.id,
            step = step.step_number,
            action = %step.action,
            "Step executed"
        );

        record.write().results.push(StepResult {
            step: step.step_number,
            action: step.action.clone(),
            result,
            timestamp: Utc::now(),
        });
    }

    let mut rec = record.write();
    if rec.state == RunState::Running {
        rec.state = RunState::Completed;
    }
    drop(rec);
    running.store(false, Ordering::Relaxed);
    info!(scenario = %scenario.id, "Scenario run completed");
}
