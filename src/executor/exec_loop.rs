//! Core execution loop
//!
//! `step()` is the heart of the interpreter: it advances the VM by one unit of
//! work without ever awaiting. The async drivers below call it repeatedly and
//! service the dispatcher whenever the VM suspends.
//!
//! ## Function Organization
//! 1. run_until_done() / run_one_step() - top-level async drivers
//! 2. drive() - one VM step plus dispatcher round-trip
//! 3. step() - synchronous state transition

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::dispatcher::Dispatcher;
use super::errors::RuntimeError;
use super::statements::{bind_next_item, execute_statement, finish_frame};
use super::types::{Control, FrameKind, LoopPhase, RunState};
use super::vm::{fail, resume, Step, VM};

/* ===================== Public API ===================== */

/// Drive the VM until the run completes or fails
///
/// Inspect `vm.state` afterwards; a failed run leaves its error in
/// `vm.control` (see `VM::error`).
pub async fn run_until_done<D>(vm: &mut VM<'_>, dispatcher: &D, cancel: &CancellationToken)
where
    D: Dispatcher + ?Sized,
{
    while drive(vm, dispatcher, cancel).await != Step::Done {}
}

/// Drive the VM until one more top-level step has completed.
///
/// Returns `false` when the run was already over or ended without finishing
/// another step.
pub async fn run_one_step<D>(vm: &mut VM<'_>, dispatcher: &D, cancel: &CancellationToken) -> bool
where
    D: Dispatcher + ?Sized,
{
    let completed = vm.history.len();
    while vm.history.len() == completed {
        if drive(vm, dispatcher, cancel).await == Step::Done {
            break;
        }
    }
    // Settle into Completed right after the last step
    if vm.is_finished() && !vm.state.is_terminal() {
        step(vm);
    }
    vm.history.len() > completed
}

/// One VM step; a suspension is serviced before returning
pub async fn drive<D>(vm: &mut VM<'_>, dispatcher: &D, cancel: &CancellationToken) -> Step
where
    D: Dispatcher + ?Sized,
{
    if vm.state.is_terminal() {
        return Step::Done;
    }
    vm.state = RunState::Running;

    if cancel.is_cancelled() && !vm.is_finished() {
        fail(vm, RuntimeError::Cancelled);
        return Step::Done;
    }

    match step(vm) {
        Step::Suspend => {
            let request = match vm.pending_call() {
                Some(call) => call.request.clone(),
                None => return Step::Continue,
            };
            debug!(kind = ?request.kind, call = %request, "dispatching");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    fail(vm, RuntimeError::Cancelled);
                    return Step::Done;
                }
                result = dispatcher.invoke(request) => result,
            };
            resume(vm, result);
            Step::Continue
        }
        other => other,
    }
}

/* ===================== Step ===================== */

/// Execute one step of the VM
///
/// 1. Stops on active control flow (pending call or failure)
/// 2. Enters the next top-level step when the stack is empty
/// 3. Binds the next loop item or closes a finished frame
/// 4. Otherwise starts the next statement of the top frame
pub fn step(vm: &mut VM) -> Step {
    match &vm.control {
        Control::None => {}
        Control::Suspend(_) => return Step::Suspend,
        Control::Throw(_) => return Step::Done,
    }

    let Some(frame) = vm.frames.last_mut() else {
        if vm.enter_next_step().is_none() {
            vm.state = RunState::Completed;
            return Step::Done;
        }
        return Step::Continue;
    };

    if let FrameKind::Loop {
        phase: LoopPhase::Bind,
        ..
    } = frame.kind
    {
        return bind_next_item(vm);
    }

    let body = frame.body;
    match body.get(frame.idx) {
        Some(stmt) => {
            frame.idx += 1;
            execute_statement(vm, stmt)
        }
        None => finish_frame(vm),
    }
}
