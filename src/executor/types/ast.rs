//! Abstract Syntax Tree node types
//!
//! The tree is built once by the parser and never mutated afterwards; every run
//! borrows it immutably.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/* ===================== Workflow ===================== */

/// A complete workflow definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    /// Version string, e.g. `v0.1`
    pub version: String,
    /// Top-level steps in declaration order (at least one)
    pub steps: Vec<Step>,
    /// Optional `@@identity` author tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Whether the `sticky` marker is present
    #[serde(default)]
    pub sticky: bool,
}

/// A named, ordered sequence of statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub body: Vec<Statement>,
}

/* ===================== Statements ===================== */

/// Statement AST node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Statement {
    /// `if <guard> { ... }` (there is no else branch)
    Condition {
        guard: Expression,
        body: Vec<Statement>,
    },
    /// `for <var> in <iterable> { ... }`
    ForLoop {
        var: String,
        iterable: Iterable,
        body: Vec<Statement>,
    },
    /// `$register = <value | call ...>`
    RegisterAssignment {
        register: String,
        value: AssignmentSource,
    },
    /// A bare command or external call whose result is discarded
    Action { action: Action },
}

/// Right-hand side of a register assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum AssignmentSource {
    Call { call: FunctionCall },
    Value { value: Param },
}

/// Callable statement, discriminated by call kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Action {
    /// `name(args)`
    Command { call: FunctionCall },
    /// `call name(args)`
    External { call: FunctionCall },
}

impl Action {
    pub fn call(&self) -> &FunctionCall {
        match self {
            Action::Command { call } | Action::External { call } => call,
        }
    }
}

/// Function name plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Param>,
}

/* ===================== Values and Expressions ===================== */

/// Literal or reference appearing as an argument, assigned value or operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Param {
    String(String),
    Integer(IntegerLiteral),
    Boolean(bool),
    /// Resolved against loop variables first, then registers
    Identifier(String),
    /// `$name`, resolved against registers only
    Register(String),
}

/// Unsigned integer literal, kept as the digits written in source.
///
/// Any digit string is a valid literal; whether it fits a runtime integer is
/// decided when it is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntegerLiteral(String);

impl IntegerLiteral {
    /// `None` unless `digits` is a non-empty run of ASCII digits
    pub fn new(digits: impl Into<String>) -> Option<Self> {
        let digits = digits.into();
        let valid = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
        valid.then_some(Self(digits))
    }

    /// Numeric value, if it fits in an `i64`
    pub fn to_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<u64> for IntegerLiteral {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl TryFrom<String> for IntegerLiteral {
    type Error = String;

    fn try_from(digits: String) -> Result<Self, Self::Error> {
        IntegerLiteral::new(digits.clone())
            .ok_or_else(|| format!("'{}' is not an integer literal", digits))
    }
}

impl From<IntegerLiteral> for String {
    fn from(literal: IntegerLiteral) -> Self {
        literal.0
    }
}

impl fmt::Display for IntegerLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Guard expression of a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expression {
    Range { range: RangeExpression },
    Comparison {
        left: Param,
        op: ComparisonOperator,
        right: Param,
    },
    Simple { value: Param },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::Less => "<",
            ComparisonOperator::GreaterEqual => ">=",
            ComparisonOperator::LessEqual => "<=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(ComparisonOperator::Equal),
            "!=" => Some(ComparisonOperator::NotEqual),
            ">" => Some(ComparisonOperator::Greater),
            "<" => Some(ComparisonOperator::Less),
            ">=" => Some(ComparisonOperator::GreaterEqual),
            "<=" => Some(ComparisonOperator::LessEqual),
            _ => None,
        }
    }

    /// Whether this operator needs an ordering (numeric operands only)
    pub fn is_ordering(&self) -> bool {
        !matches!(self, ComparisonOperator::Equal | ComparisonOperator::NotEqual)
    }
}

/// Source of a for loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Iterable {
    Split { split: SplitExpression },
    Range { range: RangeExpression },
}

/// `<source>.split("<delimiter>")`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitExpression {
    pub source: SplitSource,
    pub delimiter: String,
}

/// What a split expression may read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum SplitSource {
    String(String),
    Identifier(String),
    Register(String),
}

/// `<start>..<end>`, inclusive of both bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeExpression {
    pub start: String,
    pub end: String,
}

/* ===================== Locations ===================== */

/// Index path of a statement inside its step, outermost first.
///
/// `[2, 0]` is the first statement nested inside the step's third statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementPath(pub Vec<usize>);

impl StatementPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StatementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "-");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/* ===================== Introspection ===================== */

impl Workflow {
    /// Distinct names of every command and external function the workflow dispatches to
    pub fn function_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for step in &self.steps {
            visit_statements(&step.body, &mut |stmt| match stmt {
                Statement::Action { action } => {
                    names.insert(action.call().name.clone());
                }
                Statement::RegisterAssignment {
                    value: AssignmentSource::Call { call },
                    ..
                } => {
                    names.insert(call.name.clone());
                }
                _ => {}
            });
        }
        names
    }

    /// Every register name the workflow assigns
    pub fn register_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for step in &self.steps {
            visit_statements(&step.body, &mut |stmt| {
                if let Statement::RegisterAssignment { register, .. } = stmt {
                    names.insert(register.clone());
                }
            });
        }
        names
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Depth-first, source-order walk over a statement list and all nested bodies
pub fn visit_statements<'a, F>(body: &'a [Statement], visit: &mut F)
where
    F: FnMut(&'a Statement),
{
    for stmt in body {
        visit(stmt);
        if let Some(nested) = stmt.body() {
            visit_statements(nested, visit);
        }
    }
}

impl Statement {
    /// Nested body, for conditions and loops
    pub fn body(&self) -> Option<&[Statement]> {
        match self {
            Statement::Condition { body, .. } | Statement::ForLoop { body, .. } => Some(body),
            Statement::RegisterAssignment { .. } | Statement::Action { .. } => None,
        }
    }

    /// Short label used in logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Condition { .. } => "condition",
            Statement::ForLoop { .. } => "for",
            Statement::RegisterAssignment { .. } => "assign",
            Statement::Action { .. } => "action",
        }
    }
}
