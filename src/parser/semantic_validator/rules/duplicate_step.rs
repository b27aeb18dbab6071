//! Rule: Duplicate Step
//!
//! Steps run in declaration order regardless of their names, but two steps
//! with the same name make failure locations and step history ambiguous.

use std::collections::HashSet;

use super::super::{ValidationError, ValidationRule};
use crate::executor::types::ast::{StatementPath, Workflow};

pub struct DuplicateStepRule;

impl ValidationRule for DuplicateStepRule {
    fn id(&self) -> &'static str {
        "duplicate-step"
    }

    fn description(&self) -> &'static str {
        "Step names should be unique within a workflow"
    }

    fn validate(&self, workflow: &Workflow) -> Vec<ValidationError> {
        let mut seen = HashSet::new();
        workflow
            .steps
            .iter()
            .filter(|step| !seen.insert(step.name.as_str()))
            .map(|step| {
                ValidationError::warning(
                    &step.name,
                    StatementPath::root(),
                    format!("step '{}' is declared more than once", step.name),
                    self.id(),
                )
            })
            .collect()
    }
}
