//! Control flow and execution frame types

use serde::{Deserialize, Serialize};

use super::ast::Statement;
use super::phase::LoopPhase;
use super::values::Val;
use crate::executor::dispatcher::DispatchRequest;
use crate::executor::errors::RuntimeError;

/* ===================== Control Flow ===================== */

/// Control flow state
///
/// When control != None the exec loop stops stepping: either the VM waits on
/// the dispatcher (Suspend) or the run has failed (Throw).
#[derive(Debug)]
pub enum Control {
    None,
    /// Waiting for the dispatcher to answer this call
    Suspend(PendingCall),
    /// Unrecovered error; the run is over
    Throw(RuntimeError),
}

/// A dispatcher call the VM is suspended on
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub request: DispatchRequest,
    /// Register receiving the result; `None` for bare actions
    pub target: Option<String>,
}

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/* ===================== Frames ===================== */

/// Frame kind - what owns the statement list being walked
#[derive(Debug, Clone)]
pub enum FrameKind {
    /// Body of a top-level step
    Step { index: usize },
    /// Body of a condition whose guard held
    Condition,
    /// Body of a for loop, once per materialized item
    Loop {
        var: String,
        items: Vec<Val>,
        next_item: usize,
        phase: LoopPhase,
    },
}

/// Execution frame - one per active statement list
///
/// Frames borrow their statements from the workflow, which outlives the VM.
#[derive(Debug, Clone)]
pub struct Frame<'w> {
    pub kind: FrameKind,
    pub body: &'w [Statement],
    /// Index of the next statement to start
    pub idx: usize,
}

impl<'w> Frame<'w> {
    pub fn new(kind: FrameKind, body: &'w [Statement]) -> Self {
        Self { kind, body, idx: 0 }
    }

    /// Index of the statement most recently started in this frame
    pub fn cursor(&self) -> Option<usize> {
        self.idx.checked_sub(1)
    }
}
