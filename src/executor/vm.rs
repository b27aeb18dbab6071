//! Virtual Machine state
//!
//! The VM holds all state of one run:
//! - frames: stack of statement lists being walked
//! - control: suspended on a dispatcher call, failed, or free to step
//! - env: the run's register store plus loop-variable overlay
//!
//! The VM never awaits anything itself. See `exec_loop` for the driver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::{DispatchError, ExecutionError, RuntimeError};
use super::registers::{Env, RegisterStore};
use super::types::{Control, Frame, FrameKind, PendingCall, RunState, StatementPath, Val, Workflow};
use crate::config::EngineConfig;

/* ===================== Step History ===================== */

/// Summary of one completed top-level step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub name: String,
    /// Statements started, nested ones included
    pub statements_executed: usize,
    /// Dispatcher calls made
    pub dispatches: usize,
    /// Registers after the step, when snapshots are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registers: Option<BTreeMap<String, Val>>,
}

#[derive(Debug, Clone, Default)]
struct StepProgress {
    statements: usize,
    dispatches: usize,
}

/* ===================== VM ===================== */

/// Virtual Machine state for a single run
#[derive(Debug)]
pub struct VM<'w> {
    pub workflow: &'w Workflow,

    /// Stack of execution frames
    pub frames: Vec<Frame<'w>>,

    /// Current control flow state
    pub control: Control,

    /// Registers and loop bindings
    pub env: Env,

    pub state: RunState,

    /// Completed steps, in order
    pub history: Vec<StepRecord>,

    pub config: EngineConfig,

    /// Index of the next top-level step to enter
    next_step: usize,
    progress: StepProgress,
    failed_at: Option<(String, StatementPath)>,
}

impl<'w> VM<'w> {
    /// Create an idle VM over a workflow and its initial registers
    pub fn new(workflow: &'w Workflow, registers: RegisterStore, config: EngineConfig) -> Self {
        VM {
            workflow,
            frames: vec![],
            control: Control::None,
            env: Env::new(registers),
            state: RunState::Idle,
            history: vec![],
            config,
            next_step: 0,
            progress: StepProgress::default(),
            failed_at: None,
        }
    }

    /// True once every step has been entered and all frames are gone
    pub fn is_finished(&self) -> bool {
        self.frames.is_empty() && self.next_step >= self.workflow.steps.len()
    }

    /// The call the VM is suspended on, if any
    pub fn pending_call(&self) -> Option<&PendingCall> {
        match &self.control {
            Control::Suspend(call) => Some(call),
            _ => None,
        }
    }

    /// Step name and statement path of the innermost statement in flight
    pub fn location(&self) -> (String, StatementPath) {
        let step_index = self.frames.iter().find_map(|f| match f.kind {
            FrameKind::Step { index } => Some(index),
            _ => None,
        });

        match step_index {
            Some(index) => {
                let path = self.frames.iter().filter_map(|f| f.cursor()).collect();
                (self.workflow.steps[index].name.clone(), StatementPath(path))
            }
            None => {
                let name = self
                    .workflow
                    .steps
                    .get(self.next_step)
                    .or_else(|| self.workflow.steps.last())
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                (name, StatementPath::root())
            }
        }
    }

    /// The error of a failed run, with its location
    pub fn error(&self) -> Option<ExecutionError> {
        let Control::Throw(source) = &self.control else {
            return None;
        };
        let (step, path) = self.failed_at.clone().unwrap_or_else(|| self.location());
        Some(ExecutionError {
            step,
            path,
            source: source.clone(),
        })
    }

    /* ---------- bookkeeping used by the statement handlers ---------- */

    pub(crate) fn note_statement(&mut self) {
        self.progress.statements += 1;
    }

    pub(crate) fn enter_next_step(&mut self) -> Option<usize> {
        let index = self.next_step;
        let step = self.workflow.steps.get(index)?;
        debug!(step = %step.name, index, "entering step");
        self.frames
            .push(Frame::new(FrameKind::Step { index }, &step.body));
        self.next_step += 1;
        self.progress = StepProgress::default();
        Some(index)
    }

    pub(crate) fn record_step(&mut self, index: usize) {
        let progress = std::mem::take(&mut self.progress);
        let name = self.workflow.steps[index].name.clone();
        debug!(
            step = %name,
            statements = progress.statements,
            dispatches = progress.dispatches,
            "step completed"
        );
        let registers = self
            .config
            .snapshot_registers
            .then(|| self.env.registers.snapshot());
        self.history.push(StepRecord {
            index,
            name,
            statements_executed: progress.statements,
            dispatches: progress.dispatches,
            registers,
        });
    }

    /// Suspend on a dispatcher call
    pub(crate) fn suspend(&mut self, call: PendingCall) {
        self.progress.dispatches += 1;
        self.control = Control::Suspend(call);
    }
}

/* ===================== Failure and Resumption ===================== */

/// Fail the run: record the location, drop every frame and binding
pub fn fail(vm: &mut VM, error: RuntimeError) {
    let (step, path) = vm.location();
    warn!(step = %step, path = %path, error = %error, "workflow run failed");
    vm.failed_at = Some((step, path));
    vm.frames.clear();
    vm.env.scopes.clear();
    vm.control = Control::Throw(error);
    vm.state = RunState::Failed;
}

/// Feed a dispatcher answer back into a suspended VM
pub fn resume(vm: &mut VM, result: Result<Val, DispatchError>) {
    let call = match std::mem::replace(&mut vm.control, Control::None) {
        Control::Suspend(call) => call,
        other => {
            // Nothing was pending
            vm.control = other;
            return;
        }
    };

    match result {
        Ok(value) => {
            if let Some(register) = call.target {
                vm.env.registers.set(register, value);
            }
        }
        Err(source) => fail(
            vm,
            RuntimeError::Dispatch {
                function: call.request.name,
                source,
            },
        ),
    }
}

/* ===================== Step Result ===================== */

/// Result of executing one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue to next step
    Continue,
    /// Waiting on the dispatcher; call `resume` with its answer
    Suspend,
    /// Execution complete or failed
    Done,
}
