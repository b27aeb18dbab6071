//! Statement execution handlers
//!
//! Each statement kind has its own handler. Handlers either finish the
//! statement on the spot, push a frame for a nested body, or suspend the VM on
//! a dispatcher call.

use tracing::trace;

use super::dispatcher::{CallKind, DispatchRequest};
use super::errors::RuntimeError;
use super::expressions::{evaluate_guard, evaluate_iterable, resolve_args, resolve_param};
use super::types::{
    Action, AssignmentSource, Expression, Frame, FrameKind, FunctionCall, Iterable, LoopPhase,
    PendingCall, Statement, Val,
};
use super::vm::{fail, Step, VM};

/* ===================== Dispatch ===================== */

/// Start one statement. The caller has already advanced the frame cursor.
pub fn execute_statement<'w>(vm: &mut VM<'w>, stmt: &'w Statement) -> Step {
    vm.note_statement();
    trace!(kind = stmt.kind_name(), "statement");

    let outcome = match stmt {
        Statement::Condition { guard, body } => execute_condition(vm, guard, body),
        Statement::ForLoop {
            var,
            iterable,
            body,
        } => execute_for_loop(vm, var, iterable, body),
        Statement::RegisterAssignment { register, value } => {
            execute_assignment(vm, register, value)
        }
        Statement::Action { action } => execute_action(vm, action),
    };

    match outcome {
        Ok(step) => step,
        Err(error) => {
            fail(vm, error);
            Step::Done
        }
    }
}

/* ===================== Statement Handlers ===================== */

/// Execute Condition statement
fn execute_condition<'w>(
    vm: &mut VM<'w>,
    guard: &Expression,
    body: &'w [Statement],
) -> Result<Step, RuntimeError> {
    if evaluate_guard(guard, &vm.env)? {
        vm.frames.push(Frame::new(FrameKind::Condition, body));
    }
    Ok(Step::Continue)
}

/// Execute ForLoop statement
///
/// The iterable is materialized once, up front. The loop frame starts in the
/// Bind phase so the first item is bound on the next step.
fn execute_for_loop<'w>(
    vm: &mut VM<'w>,
    var: &str,
    iterable: &Iterable,
    body: &'w [Statement],
) -> Result<Step, RuntimeError> {
    let items = evaluate_iterable(iterable, &vm.env, vm.config.max_loop_iterations)?;
    trace!(var, items = items.len(), "loop materialized");

    if !items.is_empty() {
        vm.frames.push(Frame::new(
            FrameKind::Loop {
                var: var.to_string(),
                items,
                next_item: 0,
                phase: LoopPhase::Bind,
            },
            body,
        ));
    }
    Ok(Step::Continue)
}

/// Execute RegisterAssignment statement
fn execute_assignment(
    vm: &mut VM,
    register: &str,
    value: &AssignmentSource,
) -> Result<Step, RuntimeError> {
    match value {
        AssignmentSource::Value { value } => {
            let resolved = resolve_param(value, &vm.env)?;
            vm.env.registers.set(register, resolved);
            Ok(Step::Continue)
        }
        AssignmentSource::Call { call } => {
            suspend_on(vm, CallKind::External, call, Some(register.to_string()))
        }
    }
}

/// Execute Action statement; the dispatcher's answer is discarded
fn execute_action(vm: &mut VM, action: &Action) -> Result<Step, RuntimeError> {
    let kind = match action {
        Action::Command { .. } => CallKind::Command,
        Action::External { .. } => CallKind::External,
    };
    suspend_on(vm, kind, action.call(), None)
}

fn suspend_on(
    vm: &mut VM,
    kind: CallKind,
    call: &FunctionCall,
    target: Option<String>,
) -> Result<Step, RuntimeError> {
    let args: Vec<Val> = resolve_args(&call.args, &vm.env)?;
    vm.suspend(PendingCall {
        request: DispatchRequest {
            kind,
            name: call.name.clone(),
            args,
        },
        target,
    });
    Ok(Step::Suspend)
}

/* ===================== Loop Binding ===================== */

/// Bind the next loop item, or pop the loop frame once items run out.
///
/// Called with the loop frame on top of the stack in the Bind phase.
pub fn bind_next_item(vm: &mut VM) -> Step {
    let Some(frame) = vm.frames.last_mut() else {
        return Step::Continue;
    };

    let FrameKind::Loop {
        var,
        items,
        next_item,
        phase,
    } = &mut frame.kind
    else {
        return Step::Continue;
    };

    match items.get(*next_item) {
        Some(item) => {
            trace!(var = %var, iteration = *next_item, "loop bind");
            vm.env.scopes.push(var.clone(), item.clone());
            *next_item += 1;
            *phase = LoopPhase::Body;
            frame.idx = 0;
        }
        None => {
            vm.frames.pop();
        }
    }
    Step::Continue
}

/// Close the top frame once its body has run to the end
pub fn finish_frame(vm: &mut VM) -> Step {
    let Some(frame) = vm.frames.last_mut() else {
        return Step::Continue;
    };

    match &mut frame.kind {
        FrameKind::Step { index } => {
            let index = *index;
            vm.frames.pop();
            vm.record_step(index);
        }
        FrameKind::Condition => {
            vm.frames.pop();
        }
        FrameKind::Loop { phase, .. } => {
            // Restore the outer view before the next item is bound
            vm.env.scopes.pop();
            *phase = LoopPhase::Bind;
        }
    }
    Step::Continue
}
