//! Rule: Unused Loop Variable
//!
//! Hints when a loop variable is never referenced inside its body. Variables
//! starting with `_` are exempt.

use super::super::{walk_workflow, ValidationError, ValidationRule};
use super::{statement_reads, Read};
use crate::executor::types::ast::{visit_statements, Statement, Workflow};

pub struct UnusedLoopVariableRule;

impl ValidationRule for UnusedLoopVariableRule {
    fn id(&self) -> &'static str {
        "unused-loop-variable"
    }

    fn description(&self) -> &'static str {
        "Loop variables should be used in the loop body"
    }

    fn validate(&self, workflow: &Workflow) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        walk_workflow(workflow, &mut |step, path, stmt| {
            let Statement::ForLoop { var, body, .. } = stmt else {
                return;
            };
            if var.starts_with('_') || references(body, var) {
                return;
            }
            errors.push(ValidationError::hint(
                &step.name,
                path.clone(),
                format!("loop variable '{}' is never used", var),
                self.id(),
            ));
        });

        errors
    }
}

fn references(body: &[Statement], var: &str) -> bool {
    let mut found = false;
    visit_statements(body, &mut |stmt| {
        found |= statement_reads(stmt).iter().any(|read| match read {
            Read::Identifier(name) | Read::Bound(name) => *name == var,
            Read::Register(_) => false,
        });
    });
    found
}
