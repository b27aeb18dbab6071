//! Type definitions for the executor
//!
//! This module contains all the core types used by the executor:
//! - AST nodes (Workflow, Step, Statement, ...)
//! - Runtime values (Val)
//! - Control flow (Control, Frame, FrameKind, RunState)
//! - Loop phases

pub mod ast;
pub mod control;
pub mod phase;
pub mod values;

pub use ast::{
    Action, AssignmentSource, ComparisonOperator, Expression, FunctionCall, IntegerLiteral,
    Iterable, Param, RangeExpression, SplitExpression, SplitSource, Statement, StatementPath,
    Step, Workflow,
};
pub use control::{Control, Frame, FrameKind, PendingCall, RunState};
pub use phase::LoopPhase;
pub use values::Val;
