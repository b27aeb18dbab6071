//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `undefined_register.rs` - `$name` read before any assignment
//! - `duplicate_step.rs` - two steps with the same name
//! - `unused_loop_variable.rs` - loop variable never referenced in its body
//! - `loop_shadows_register.rs` - loop variable named like an assigned register

mod duplicate_step;
mod loop_shadows_register;
mod undefined_register;
mod unused_loop_variable;

pub use duplicate_step::DuplicateStepRule;
pub use loop_shadows_register::LoopShadowsRegisterRule;
pub use undefined_register::UndefinedRegisterRule;
pub use unused_loop_variable::UnusedLoopVariableRule;

use crate::executor::types::ast::{
    Action, AssignmentSource, Expression, Iterable, Param, RangeExpression, SplitSource, Statement,
};

/// A name read by a statement itself, nested bodies excluded
pub(crate) enum Read<'a> {
    /// `$name`
    Register(&'a str),
    /// Bare identifier
    Identifier(&'a str),
    /// Range bounds are bare names
    Bound(&'a str),
}

pub(crate) fn statement_reads(stmt: &Statement) -> Vec<Read<'_>> {
    let mut reads = Vec::new();
    match stmt {
        Statement::Condition { guard, .. } => match guard {
            Expression::Range { range } => push_range(range, &mut reads),
            Expression::Comparison { left, right, .. } => {
                push_param(left, &mut reads);
                push_param(right, &mut reads);
            }
            Expression::Simple { value } => push_param(value, &mut reads),
        },
        Statement::ForLoop { iterable, .. } => match iterable {
            Iterable::Split { split } => match &split.source {
                SplitSource::Register(name) => reads.push(Read::Register(name)),
                SplitSource::Identifier(name) => reads.push(Read::Identifier(name)),
                SplitSource::String(_) => {}
            },
            Iterable::Range { range } => push_range(range, &mut reads),
        },
        Statement::RegisterAssignment { value, .. } => match value {
            AssignmentSource::Call { call } => {
                call.args.iter().for_each(|arg| push_param(arg, &mut reads))
            }
            AssignmentSource::Value { value } => push_param(value, &mut reads),
        },
        Statement::Action { action } => action
            .call()
            .args
            .iter()
            .for_each(|arg| push_param(arg, &mut reads)),
    }
    reads
}

fn push_param<'a>(param: &'a Param, reads: &mut Vec<Read<'a>>) {
    match param {
        Param::Register(name) => reads.push(Read::Register(name)),
        Param::Identifier(name) => reads.push(Read::Identifier(name)),
        Param::String(_) | Param::Integer(_) | Param::Boolean(_) => {}
    }
}

fn push_range<'a>(range: &'a RangeExpression, reads: &mut Vec<Read<'a>>) {
    reads.push(Read::Bound(&range.start));
    reads.push(Read::Bound(&range.end));
}
