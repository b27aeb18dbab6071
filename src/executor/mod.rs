//! # Executor - Suspendable Frame-Stack Interpreter
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: all walk state lives in `frames: Vec<Frame>`, no recursion
//! 2. **Borrowed AST**: frames point into the workflow; a run never mutates it
//! 3. **Centralized control flow**: `Control` records a pending call or the failure
//! 4. **Pure VM**: `step()` never awaits; dispatcher calls are explicit suspension points
//!
//! [`Execution`] wraps a VM with a dispatcher, a cancellation token and run
//! bookkeeping. [`execute`] is the one-shot form.

pub mod dispatcher;
pub mod errors;
pub mod exec_loop;
pub mod expressions;
pub mod registers;
pub mod statements;
pub mod stdlib;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;

// Re-export commonly used items
pub use dispatcher::{CallKind, DispatchRequest, Dispatcher, FunctionRegistry};
pub use errors::{DispatchError, ExecutionError, ResolutionError, RuntimeError, TypeMismatchError};
pub use exec_loop::{run_until_done, step};
pub use registers::RegisterStore;
pub use types::{RunState, StatementPath, Val, Workflow};
pub use vm::{Step, StepRecord, VM};

/* ===================== Results ===================== */

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub workflow: String,
    /// Final register contents
    pub registers: BTreeMap<String, Val>,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/* ===================== Execution ===================== */

/// One run of a workflow against a dispatcher
///
/// Owns the run's register store. Independent executions of the same workflow
/// share nothing but the dispatcher.
pub struct Execution<'w, 'd, D: Dispatcher + ?Sized> {
    vm: VM<'w>,
    dispatcher: &'d D,
    cancel: CancellationToken,
    run_id: Uuid,
    started_at: Option<DateTime<Utc>>,
}

impl<'w, 'd, D: Dispatcher + ?Sized> Execution<'w, 'd, D> {
    pub fn new(workflow: &'w Workflow, bindings: HashMap<String, Val>, dispatcher: &'d D) -> Self {
        Self {
            vm: VM::new(workflow, RegisterStore::from(bindings), EngineConfig::default()),
            dispatcher,
            cancel: CancellationToken::new(),
            run_id: Uuid::new_v4(),
            started_at: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.vm.config = config;
        self
    }

    /// Cancel the run cooperatively through `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.vm.state
    }

    pub fn registers(&self) -> &RegisterStore {
        &self.vm.env.registers
    }

    /// Steps completed so far
    pub fn history(&self) -> &[StepRecord] {
        &self.vm.history
    }

    /// Run to the end
    pub async fn run(&mut self) -> Result<ExecutionResult, ExecutionError> {
        self.begin();
        run_until_done(&mut self.vm, self.dispatcher, &self.cancel).await;
        self.outcome()
    }

    /// Run exactly one top-level step.
    ///
    /// Returns `Ok(None)` once every step has completed.
    pub async fn advance_step(&mut self) -> Result<Option<StepRecord>, ExecutionError> {
        if self.vm.state == RunState::Completed {
            return Ok(None);
        }
        self.begin();

        let advanced = exec_loop::run_one_step(&mut self.vm, self.dispatcher, &self.cancel).await;
        if let Some(error) = self.vm.error() {
            return Err(error);
        }
        if self.vm.state == RunState::Completed {
            self.log_completion();
        }

        Ok(if advanced {
            self.vm.history.last().cloned()
        } else {
            None
        })
    }

    fn begin(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(Utc::now());
        info!(
            run_id = %self.run_id,
            workflow = %self.vm.workflow.name,
            version = %self.vm.workflow.version,
            "workflow run started"
        );
    }

    fn log_completion(&self) {
        info!(
            run_id = %self.run_id,
            workflow = %self.vm.workflow.name,
            steps = self.vm.history.len(),
            "workflow run completed"
        );
    }

    fn outcome(&self) -> Result<ExecutionResult, ExecutionError> {
        if let Some(error) = self.vm.error() {
            return Err(error);
        }
        self.log_completion();

        let finished_at = Utc::now();
        Ok(ExecutionResult {
            run_id: self.run_id,
            workflow: self.vm.workflow.name.clone(),
            registers: self.vm.env.registers.snapshot(),
            steps: self.vm.history.clone(),
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
        })
    }
}

/// Run a workflow to completion with the default engine configuration
pub async fn execute<D>(
    workflow: &Workflow,
    bindings: HashMap<String, Val>,
    dispatcher: &D,
) -> Result<ExecutionResult, ExecutionError>
where
    D: Dispatcher + ?Sized,
{
    let mut execution = Execution::new(workflow, bindings, dispatcher);
    execution.run().await
}
