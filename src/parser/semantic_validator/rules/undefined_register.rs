//! Rule: Undefined Register
//!
//! Warns when `$name` is read before any statement earlier in source order
//! assigns it.
//!
//! ```cadence
//! workflow w v1 {
//!     step one {
//!         print($greeting)   // warning: '$greeting' is read before it is assigned
//!         $greeting = "hi"
//!     }
//! }
//! ```
//!
//! The register may still arrive through the run's initial bindings, which is
//! why this is a warning. Each register is reported once.

use std::collections::HashSet;

use super::super::{walk_workflow, ValidationError, ValidationRule};
use super::{statement_reads, Read};
use crate::executor::types::ast::{Statement, Workflow};

pub struct UndefinedRegisterRule;

impl ValidationRule for UndefinedRegisterRule {
    fn id(&self) -> &'static str {
        "undefined-register"
    }

    fn description(&self) -> &'static str {
        "Registers should be assigned before they are read"
    }

    fn validate(&self, workflow: &Workflow) -> Vec<ValidationError> {
        let mut assigned: HashSet<&str> = HashSet::new();
        let mut reported: HashSet<&str> = HashSet::new();
        let mut errors = Vec::new();

        walk_workflow(workflow, &mut |step, path, stmt| {
            // The right-hand side is read before the target is written
            for read in statement_reads(stmt) {
                if let Read::Register(name) = read {
                    if !assigned.contains(name) && reported.insert(name) {
                        errors.push(ValidationError::warning(
                            &step.name,
                            path.clone(),
                            format!("'${}' is read before it is assigned", name),
                            self.id(),
                        ));
                    }
                }
            }
            if let Statement::RegisterAssignment { register, .. } = stmt {
                assigned.insert(register.as_str());
            }
        });

        errors
    }
}
