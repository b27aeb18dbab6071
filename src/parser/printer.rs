//! Canonical source printer
//!
//! `parse_workflow(&to_source(&w))` gives back `w` for any workflow whose names
//! are valid identifiers.

use std::fmt::{self, Write};

use crate::executor::types::ast::{
    Action, AssignmentSource, Expression, FunctionCall, Iterable, Param, RangeExpression,
    SplitSource, Statement, Workflow,
};

const INDENT: &str = "    ";

/// Render a workflow in canonical form
pub fn to_source(workflow: &Workflow) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_workflow(&mut out, workflow);
    out
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_workflow(f, self)
    }
}

fn write_workflow<W: Write>(out: &mut W, workflow: &Workflow) -> fmt::Result {
    writeln!(out, "workflow {} {} {{", workflow.name, workflow.version)?;
    for step in &workflow.steps {
        writeln!(out, "{}step {} {{", INDENT, step.name)?;
        write_body(out, &step.body, 2)?;
        writeln!(out, "{}}}", INDENT)?;
    }
    write!(out, "}}")?;

    if let Some(author) = &workflow.author {
        write!(out, " @@{}", author)?;
    }
    if workflow.sticky {
        write!(out, " sticky")?;
    }
    writeln!(out)
}

fn write_body<W: Write>(out: &mut W, body: &[Statement], depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    for stmt in body {
        match stmt {
            Statement::Condition { guard, body } => {
                writeln!(out, "{}if {} {{", indent, expression(guard))?;
                write_body(out, body, depth + 1)?;
                writeln!(out, "{}}}", indent)?;
            }
            Statement::ForLoop {
                var,
                iterable,
                body,
            } => {
                writeln!(out, "{}for {} in {} {{", indent, var, iterable_source(iterable))?;
                write_body(out, body, depth + 1)?;
                writeln!(out, "{}}}", indent)?;
            }
            Statement::RegisterAssignment { register, value } => {
                let rhs = match value {
                    AssignmentSource::Call { call } => format!("call {}", call_source(call)),
                    AssignmentSource::Value { value } => param(value),
                };
                writeln!(out, "{}${} = {}", indent, register, rhs)?;
            }
            Statement::Action { action } => match action {
                Action::Command { call } => writeln!(out, "{}{}", indent, call_source(call))?,
                Action::External { call } => writeln!(out, "{}call {}", indent, call_source(call))?,
            },
        }
    }
    Ok(())
}

fn expression(expr: &Expression) -> String {
    match expr {
        Expression::Range { range } => range_source(range),
        Expression::Comparison { left, op, right } => {
            format!("{} {} {}", param(left), op.symbol(), param(right))
        }
        Expression::Simple { value } => param(value),
    }
}

fn iterable_source(iterable: &Iterable) -> String {
    match iterable {
        Iterable::Split { split } => {
            let source = match &split.source {
                SplitSource::String(s) => quote(s),
                SplitSource::Identifier(name) => name.clone(),
                SplitSource::Register(name) => format!("${}", name),
            };
            format!("{}.split({})", source, quote(&split.delimiter))
        }
        Iterable::Range { range } => range_source(range),
    }
}

fn range_source(range: &RangeExpression) -> String {
    format!("{}..{}", range.start, range.end)
}

fn call_source(call: &FunctionCall) -> String {
    let args: Vec<String> = call.args.iter().map(param).collect();
    format!("{}({})", call.name, args.join(", "))
}

fn param(value: &Param) -> String {
    match value {
        Param::String(s) => quote(s),
        Param::Integer(n) => n.to_string(),
        Param::Boolean(b) => b.to_string(),
        Param::Identifier(name) => name.clone(),
        Param::Register(name) => format!("${}", name),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
