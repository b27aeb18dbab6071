//! Semantic Validation for Cadence Workflows
//!
//! Advisory, rule-based checks that run after parsing. Nothing here is
//! enforced by `parse_workflow` or the executor: registers may be supplied as
//! initial bindings, so most findings are warnings or hints.
//!
//! # Usage
//!
//! ```ignore
//! use cadence_core::parser::{parse_workflow, semantic_validator::validate_workflow};
//!
//! let workflow = parse_workflow(source)?;
//! for diagnostic in validate_workflow(&workflow) {
//!     eprintln!("{}", diagnostic);
//! }
//! ```
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `semantic_validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use serde::Serialize;

use crate::executor::types::ast::{Statement, StatementPath, Step, Workflow};

// ============================================================================
// Validation Error Types
// ============================================================================

/// A finding produced by semantic analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Step containing the issue
    pub step: String,
    /// Statement inside the step; empty for step-level findings
    pub path: StatementPath,
    pub message: String,
    pub severity: Severity,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

/// Severity levels for validation findings.
///
/// There is no error level: a workflow that parses is always runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Should probably be fixed - potential bug
    Warning,
    /// Suggestion for improvement
    Hint,
}

impl ValidationError {
    pub fn warning(
        step: &str,
        path: StatementPath,
        message: impl Into<String>,
        rule_id: &'static str,
    ) -> Self {
        Self {
            step: step.to_string(),
            path,
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    pub fn hint(
        step: &str,
        path: StatementPath,
        message: impl Into<String>,
        rule_id: &'static str,
    ) -> Self {
        Self {
            severity: Severity::Hint,
            ..Self::warning(step, path, message, rule_id)
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Hint => "hint",
        };
        write!(
            f,
            "{} in step '{}' at statement {}: {} [{}]",
            severity, self.step, self.path, self.message, self.rule_id
        )
    }
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules must implement.
///
/// Each rule checks one aspect of a workflow and does not depend on the
/// results of other rules.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "duplicate-step")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    fn validate(&self, workflow: &Workflow) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

/// The main validator that orchestrates all validation rules.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::UndefinedRegisterRule),
                Box::new(rules::DuplicateStepRule),
                Box::new(rules::UnusedLoopVariableRule),
                Box::new(rules::LoopShadowsRegisterRule),
            ],
        }
    }

    /// Run all validation rules and collect errors.
    pub fn validate(&self, workflow: &Workflow) -> Vec<ValidationError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(workflow))
            .collect()
    }

    /// Ids and descriptions of every registered rule
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Visit every statement of every step in source order, with its path
pub(crate) fn walk_workflow<'a, F>(workflow: &'a Workflow, visit: &mut F)
where
    F: FnMut(&'a Step, &StatementPath, &'a Statement),
{
    for step in &workflow.steps {
        walk_body(step, &step.body, &StatementPath::root(), visit);
    }
}

fn walk_body<'a, F>(step: &'a Step, body: &'a [Statement], base: &StatementPath, visit: &mut F)
where
    F: FnMut(&'a Step, &StatementPath, &'a Statement),
{
    for (index, stmt) in body.iter().enumerate() {
        let path = base.child(index);
        visit(step, &path, stmt);
        if let Some(nested) = stmt.body() {
            walk_body(step, nested, &path, visit);
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate a workflow with every built-in rule
pub fn validate_workflow(workflow: &Workflow) -> Vec<ValidationError> {
    let validator = Validator::new();
    validator.validate(workflow)
}
