//! PEST-based parser for Cadence workflow source
//!
//! `parse_workflow` runs the grammar in `workflow.pest` and maps the parse
//! tree onto the AST in `executor::types::ast`. The builder is a structural
//! transform only: names of registers and functions are never checked here
//! (see `semantic_validator` for advisory checks).

use pest::error::{ErrorVariant, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use serde::Serialize;
use thiserror::Error;

use crate::executor::types::ast::{
    Action, AssignmentSource, ComparisonOperator, Expression, FunctionCall, IntegerLiteral,
    Iterable, Param, RangeExpression, SplitExpression, SplitSource, Statement, Step, Workflow,
};

pub mod printer;
pub mod semantic_validator;


pub use printer::to_source;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/workflow.pest"]
struct FlowParser;

/* ===================== Error Types ===================== */

/// 1-based line/column plus byte offset into the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Source does not match the grammar
    #[error("syntax error at {position}: {message}")]
    Syntax {
        message: String,
        position: Position,
        /// Productions that would have been accepted at `position`
        expected: Vec<String>,
    },

    /// Parse tree does not have the shape the grammar promises
    #[error("malformed parse tree: {message}")]
    Build {
        message: String,
        position: Option<Position>,
    },
}

impl ParseError {
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::Syntax { position, .. } => Some(*position),
            ParseError::Build { position, .. } => *position,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax { message, .. } | ParseError::Build { message, .. } => message,
        }
    }

    fn build(message: impl Into<String>, pair: &Pair<Rule>) -> Self {
        ParseError::Build {
            message: message.into(),
            position: Some(position_of(pair)),
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let expected = match &err.variant {
            ErrorVariant::ParsingError { positives, .. } => {
                let mut labels: Vec<String> = positives.iter().map(rule_label).collect();
                labels.sort();
                labels.dedup();
                labels
            }
            ErrorVariant::CustomError { .. } => Vec::new(),
        };

        let (line, column) = match err.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        let offset = match err.location {
            InputLocation::Pos(offset) => offset,
            InputLocation::Span((start, _)) => start,
        };

        let message = err.renamed_rules(rule_label).variant.message().into_owned();

        ParseError::Syntax {
            message,
            position: Position {
                line,
                column,
                offset,
            },
            expected,
        }
    }
}

/// Human-readable production names for error messages
fn rule_label(rule: &Rule) -> String {
    let label = match rule {
        Rule::EOI => "end of input",
        Rule::workflow => "workflow",
        Rule::version => "version (e.g. v1.0)",
        Rule::author => "author tag (@@identity)",
        Rule::identity => "identity",
        Rule::sticky => "sticky",
        Rule::step => "step",
        Rule::condition => "if",
        Rule::for_loop => "for loop",
        Rule::register_operation => "register assignment",
        Rule::action => "action",
        Rule::command => "command",
        Rule::external_fn_call => "call",
        Rule::comparison => "comparison",
        Rule::comparison_operator => "comparison operator",
        Rule::split_expression => "split expression",
        Rule::range_expression => "range expression",
        Rule::string | Rule::string_inner => "string",
        Rule::integer => "integer",
        Rule::boolean => "boolean",
        Rule::register => "register",
        Rule::identifier => "identifier",
        Rule::keyword_prefix => "keyword",
        Rule::expression => "expression",
        Rule::iterable => "iterable",
        Rule::value => "value",
        Rule::step_body => "statement",
        Rule::WHITESPACE | Rule::ident_char => "character",
    };
    label.to_string()
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Entry Point ===================== */

/// Parse workflow source into an AST
pub fn parse_workflow(source: &str) -> ParseResult<Workflow> {
    let mut pairs = FlowParser::parse(Rule::workflow, source)?;
    let pair = pairs.next().ok_or_else(|| ParseError::Build {
        message: "empty parse tree".to_string(),
        position: None,
    })?;
    build_workflow(pair)
}

/* ===================== Tree Helpers ===================== */

fn position_of(pair: &Pair<Rule>) -> Position {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    Position {
        line,
        column,
        offset: span.start(),
    }
}

/// Next child of `parent`, which must exist
fn next_child<'i>(
    children: &mut Pairs<'i, Rule>,
    parent: &Pair<'i, Rule>,
    what: &str,
) -> ParseResult<Pair<'i, Rule>> {
    children
        .next()
        .ok_or_else(|| ParseError::build(format!("{:?} without {}", parent.as_rule(), what), parent))
}

fn unexpected(pair: &Pair<Rule>) -> ParseError {
    ParseError::build(format!("unexpected {:?}", pair.as_rule()), pair)
}

/* ===================== Workflow & Steps ===================== */

fn build_workflow(pair: Pair<Rule>) -> ParseResult<Workflow> {
    let parent = pair.clone();
    let mut children = pair.into_inner();

    let name = next_child(&mut children, &parent, "a name")?.as_str().to_string();
    let version = next_child(&mut children, &parent, "a version")?.as_str().to_string();

    let mut steps = Vec::new();
    let mut author = None;
    let mut sticky = false;

    for child in children {
        match child.as_rule() {
            Rule::step => steps.push(build_step(child)?),
            Rule::author => {
                let parent = child.clone();
                let identity = next_child(&mut child.into_inner(), &parent, "an identity")?;
                author = Some(identity.as_str().to_string());
            }
            Rule::sticky => sticky = true,
            Rule::EOI => {}
            _ => return Err(unexpected(&child)),
        }
    }

    if steps.is_empty() {
        return Err(ParseError::build("workflow without steps", &parent));
    }

    Ok(Workflow {
        name,
        version,
        steps,
        author,
        sticky,
    })
}

fn build_step(pair: Pair<Rule>) -> ParseResult<Step> {
    let parent = pair.clone();
    let mut children = pair.into_inner();
    let name = next_child(&mut children, &parent, "a name")?.as_str().to_string();
    let body = build_body(children)?;

    if body.is_empty() {
        return Err(ParseError::build(format!("step '{}' has an empty body", name), &parent));
    }

    Ok(Step { name, body })
}

fn build_body(children: Pairs<Rule>) -> ParseResult<Vec<Statement>> {
    children.map(build_statement).collect()
}

/* ===================== Statements ===================== */

fn build_statement(pair: Pair<Rule>) -> ParseResult<Statement> {
    match pair.as_rule() {
        Rule::condition => build_condition(pair),
        Rule::for_loop => build_for_loop(pair),
        Rule::register_operation => build_register_operation(pair),
        Rule::action => build_action(pair),
        _ => Err(unexpected(&pair)),
    }
}

fn build_condition(pair: Pair<Rule>) -> ParseResult<Statement> {
    let parent = pair.clone();
    let mut children = pair.into_inner();
    let guard = build_expression(next_child(&mut children, &parent, "a guard")?)?;
    let body = build_body(children)?;
    Ok(Statement::Condition { guard, body })
}

fn build_for_loop(pair: Pair<Rule>) -> ParseResult<Statement> {
    let parent = pair.clone();
    let mut children = pair.into_inner();
    let var = next_child(&mut children, &parent, "a loop variable")?
        .as_str()
        .to_string();
    let iterable = build_iterable(next_child(&mut children, &parent, "an iterable")?)?;
    let body = build_body(children)?;
    Ok(Statement::ForLoop {
        var,
        iterable,
        body,
    })
}

fn build_register_operation(pair: Pair<Rule>) -> ParseResult<Statement> {
    let parent = pair.clone();
    let mut children = pair.into_inner();
    let register = register_name(&next_child(&mut children, &parent, "a register")?);

    let source = next_child(&mut children, &parent, "a value")?;
    let value = match source.as_rule() {
        Rule::external_fn_call => AssignmentSource::Call {
            call: build_call(source)?,
        },
        _ => AssignmentSource::Value {
            value: build_value(source)?,
        },
    };

    Ok(Statement::RegisterAssignment { register, value })
}

fn build_action(pair: Pair<Rule>) -> ParseResult<Statement> {
    let parent = pair.clone();
    let call = next_child(&mut pair.into_inner(), &parent, "a call")?;
    let action = match call.as_rule() {
        Rule::external_fn_call => Action::External {
            call: build_call(call)?,
        },
        Rule::command => Action::Command {
            call: build_call(call)?,
        },
        _ => return Err(unexpected(&call)),
    };
    Ok(Statement::Action { action })
}

/// Shared by commands and external calls: name, then arguments
fn build_call(pair: Pair<Rule>) -> ParseResult<FunctionCall> {
    let parent = pair.clone();
    let mut children = pair.into_inner();
    let name = next_child(&mut children, &parent, "a function name")?
        .as_str()
        .to_string();
    let args = children.map(build_value).collect::<ParseResult<Vec<_>>>()?;
    Ok(FunctionCall { name, args })
}

/* ===================== Expressions ===================== */

fn build_expression(pair: Pair<Rule>) -> ParseResult<Expression> {
    match pair.as_rule() {
        Rule::range_expression => Ok(Expression::Range {
            range: build_range(pair)?,
        }),
        Rule::comparison => {
            let parent = pair.clone();
            let mut children = pair.into_inner();
            let left = build_value(next_child(&mut children, &parent, "a left operand")?)?;
            let op_pair = next_child(&mut children, &parent, "an operator")?;
            let op = ComparisonOperator::from_symbol(op_pair.as_str())
                .ok_or_else(|| unexpected(&op_pair))?;
            let right = build_value(next_child(&mut children, &parent, "a right operand")?)?;
            Ok(Expression::Comparison { left, op, right })
        }
        _ => Ok(Expression::Simple {
            value: build_value(pair)?,
        }),
    }
}

fn build_iterable(pair: Pair<Rule>) -> ParseResult<Iterable> {
    match pair.as_rule() {
        Rule::split_expression => {
            let parent = pair.clone();
            let mut children = pair.into_inner();
            let source = build_split_source(next_child(&mut children, &parent, "a source")?)?;
            let delimiter = string_contents(next_child(&mut children, &parent, "a delimiter")?);
            Ok(Iterable::Split {
                split: SplitExpression { source, delimiter },
            })
        }
        Rule::range_expression => Ok(Iterable::Range {
            range: build_range(pair)?,
        }),
        _ => Err(unexpected(&pair)),
    }
}

fn build_range(pair: Pair<Rule>) -> ParseResult<RangeExpression> {
    let parent = pair.clone();
    let mut children = pair.into_inner();
    let start = next_child(&mut children, &parent, "a start bound")?
        .as_str()
        .to_string();
    let end = next_child(&mut children, &parent, "an end bound")?
        .as_str()
        .to_string();
    Ok(RangeExpression { start, end })
}

/* ===================== Values ===================== */

fn build_value(pair: Pair<Rule>) -> ParseResult<Param> {
    match pair.as_rule() {
        Rule::string => Ok(Param::String(string_contents(pair))),
        Rule::integer => IntegerLiteral::new(pair.as_str())
            .map(Param::Integer)
            .ok_or_else(|| unexpected(&pair)),
        Rule::boolean => Ok(Param::Boolean(pair.as_str() == "true")),
        Rule::register => Ok(Param::Register(register_name(&pair))),
        Rule::identifier => Ok(Param::Identifier(pair.as_str().to_string())),
        _ => Err(unexpected(&pair)),
    }
}

fn build_split_source(pair: Pair<Rule>) -> ParseResult<SplitSource> {
    match pair.as_rule() {
        Rule::string => Ok(SplitSource::String(string_contents(pair))),
        Rule::register => Ok(SplitSource::Register(register_name(&pair))),
        Rule::identifier => Ok(SplitSource::Identifier(pair.as_str().to_string())),
        _ => Err(unexpected(&pair)),
    }
}

fn register_name(pair: &Pair<Rule>) -> String {
    let text = pair.as_str();
    text.strip_prefix('$').unwrap_or(text).to_string()
}

fn string_contents(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|inner| unescape(inner.as_str()))
        .unwrap_or_default()
}

/// `\"` and `\\` collapse to one character; other escapes stay verbatim
pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\\')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
