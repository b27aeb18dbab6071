//! Rule: Loop Shadows Register
//!
//! Inside a loop body a bare identifier resolves to the loop variable first,
//! so naming a loop variable after an assigned register hides that register
//! from bare reads. `$name` still reaches the register.

use super::super::{walk_workflow, ValidationError, ValidationRule};
use crate::executor::types::ast::{Statement, Workflow};

pub struct LoopShadowsRegisterRule;

impl ValidationRule for LoopShadowsRegisterRule {
    fn id(&self) -> &'static str {
        "loop-shadows-register"
    }

    fn description(&self) -> &'static str {
        "Loop variables should not share a name with a register"
    }

    fn validate(&self, workflow: &Workflow) -> Vec<ValidationError> {
        let registers = workflow.register_names();
        let mut errors = Vec::new();

        walk_workflow(workflow, &mut |step, path, stmt| {
            if let Statement::ForLoop { var, .. } = stmt {
                if registers.contains(var) {
                    errors.push(ValidationError::hint(
                        &step.name,
                        path.clone(),
                        format!(
                            "loop variable '{}' shadows register '${}' for bare reads",
                            var, var
                        ),
                        self.id(),
                    ));
                }
            }
        });

        errors
    }
}
