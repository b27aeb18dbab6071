//! Expression evaluation
//!
//! Resolves params against the run's environment, evaluates condition guards
//! and materializes loop iterables. Nothing here suspends: dispatcher calls are
//! handled by the statement layer.

use std::cmp::Ordering;

use super::errors::{EvalResult, RuntimeError, TypeMismatchError};
use super::registers::Env;
use super::types::{
    ComparisonOperator, Expression, IntegerLiteral, Iterable, Param, RangeExpression,
    SplitExpression, SplitSource, Val,
};

/* ===================== Params ===================== */

/// Resolve a param to a concrete value
pub fn resolve_param(param: &Param, env: &Env) -> EvalResult<Val> {
    match param {
        Param::String(s) => Ok(Val::Str(s.clone())),
        Param::Integer(n) => literal_integer(n),
        Param::Boolean(b) => Ok(Val::Bool(*b)),
        Param::Identifier(name) => Ok(env.resolve_identifier(name)?),
        Param::Register(name) => Ok(env.resolve_register(name)?),
    }
}

/// Resolve every argument in order
pub fn resolve_args(args: &[Param], env: &Env) -> EvalResult<Vec<Val>> {
    args.iter().map(|arg| resolve_param(arg, env)).collect()
}

/// Source integers are unsigned digit strings; runtime integers are `i64`
pub fn literal_integer(literal: &IntegerLiteral) -> EvalResult<Val> {
    literal.to_i64().map(Val::Int).ok_or_else(|| {
        TypeMismatchError::new(format!("integer literal {} does not fit in i64", literal)).into()
    })
}

/* ===================== Guards ===================== */

/// Evaluate a condition guard to a boolean
pub fn evaluate_guard(expr: &Expression, env: &Env) -> EvalResult<bool> {
    match expr {
        Expression::Range { range } => {
            let (start, end) = evaluate_range_bounds(range, env)?;
            Ok(start <= end)
        }
        Expression::Comparison { left, op, right } => {
            let left = resolve_param(left, env)?;
            let right = resolve_param(right, env)?;
            Ok(compare(&left, *op, &right)?)
        }
        Expression::Simple { value } => Ok(resolve_param(value, env)?.is_truthy()),
    }
}

/// Compare two values in their common domain.
///
/// Two integers compare numerically and two booleans compare as booleans.
/// Anything else compares by textual rendering, which only supports `==` and
/// `!=`. Ordering operators require two integers.
pub fn compare(left: &Val, op: ComparisonOperator, right: &Val) -> Result<bool, TypeMismatchError> {
    let (left, right) = (left.normalized(), right.normalized());

    if let (Val::Int(l), Val::Int(r)) = (&left, &right) {
        return Ok(matches_ordering(op, l.cmp(r)));
    }

    if op.is_ordering() {
        return Err(TypeMismatchError::new(format!(
            "'{}' needs two integers, got {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    }

    let equal = match (&left, &right) {
        (Val::Bool(l), Val::Bool(r)) => l == r,
        _ => left.render() == right.render(),
    };

    Ok(match op {
        ComparisonOperator::Equal => equal,
        _ => !equal,
    })
}

fn matches_ordering(op: ComparisonOperator, ordering: Ordering) -> bool {
    match op {
        ComparisonOperator::Equal => ordering == Ordering::Equal,
        ComparisonOperator::NotEqual => ordering != Ordering::Equal,
        ComparisonOperator::Greater => ordering == Ordering::Greater,
        ComparisonOperator::Less => ordering == Ordering::Less,
        ComparisonOperator::GreaterEqual => ordering != Ordering::Less,
        ComparisonOperator::LessEqual => ordering != Ordering::Greater,
    }
}

/* ===================== Iterables ===================== */

/// Materialize a loop iterable, refusing anything longer than `limit`
pub fn evaluate_iterable(iterable: &Iterable, env: &Env, limit: usize) -> EvalResult<Vec<Val>> {
    match iterable {
        Iterable::Range { range } => {
            let (start, end) = evaluate_range_bounds(range, env)?;
            if start > end {
                return Ok(Vec::new());
            }
            let len = (end as i128 - start as i128 + 1) as u128;
            if len > limit as u128 {
                return Err(RuntimeError::IterationLimit {
                    len: usize::try_from(len).unwrap_or(usize::MAX),
                    limit,
                });
            }
            Ok((start..=end).map(Val::Int).collect())
        }
        Iterable::Split { split } => {
            let items = evaluate_split(split, env)?;
            if items.len() > limit {
                return Err(RuntimeError::IterationLimit {
                    len: items.len(),
                    limit,
                });
            }
            Ok(items)
        }
    }
}

/// Split the rendered source on the delimiter.
///
/// An empty source yields no items; an empty delimiter splits into characters.
pub fn evaluate_split(split: &SplitExpression, env: &Env) -> EvalResult<Vec<Val>> {
    let source = match &split.source {
        SplitSource::String(s) => s.clone(),
        SplitSource::Identifier(name) => env.resolve_identifier(name)?.render(),
        SplitSource::Register(name) => env.resolve_register(name)?.render(),
    };
    if source.is_empty() {
        return Ok(Vec::new());
    }

    let items = if split.delimiter.is_empty() {
        source.chars().map(|c| Val::Str(c.to_string())).collect()
    } else {
        source
            .split(split.delimiter.as_str())
            .map(|part| Val::Str(part.to_string()))
            .collect()
    };
    Ok(items)
}

/// Resolve both range bounds to integers
pub fn evaluate_range_bounds(range: &RangeExpression, env: &Env) -> EvalResult<(i64, i64)> {
    Ok((range_bound(&range.start, env)?, range_bound(&range.end, env)?))
}

fn range_bound(name: &str, env: &Env) -> EvalResult<i64> {
    // All-digit bounds are integer literals
    if let Some(literal) = IntegerLiteral::new(name) {
        return literal.to_i64().ok_or_else(|| {
            TypeMismatchError::new(format!("range bound {} does not fit in i64", name)).into()
        });
    }

    let value = env.resolve_identifier(name)?;
    value.as_int().ok_or_else(|| {
        TypeMismatchError::new(format!(
            "range bound '{}' must be an integer, got {}",
            name,
            value.type_name()
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::errors::ResolutionError;
    use crate::executor::registers::RegisterStore;
    use serde_json::json;

    fn env_with(pairs: &[(&str, Val)]) -> Env {
        Env::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<RegisterStore>(),
        )
    }

    #[test]
    fn test_compare_numeric() {
        assert!(compare(&Val::Int(5), ComparisonOperator::Greater, &Val::Int(3)).unwrap());
        assert!(compare(&Val::Int(3), ComparisonOperator::LessEqual, &Val::Int(3)).unwrap());
        assert!(!compare(&Val::Int(3), ComparisonOperator::NotEqual, &Val::Int(3)).unwrap());
        assert!(compare(&Val::Json(json!(10)), ComparisonOperator::GreaterEqual, &Val::Int(2)).unwrap());
    }

    #[test]
    fn test_ordering_outside_numeric_domain_is_mismatch() {
        let err = compare(&Val::from("5"), ComparisonOperator::Greater, &Val::Int(3)).unwrap_err();
        assert!(err.message.contains("'>'"));
        assert!(compare(&Val::Bool(true), ComparisonOperator::Less, &Val::Bool(false)).is_err());
        assert!(compare(&Val::from("a"), ComparisonOperator::Less, &Val::from("b")).is_err());
    }

    #[test]
    fn test_equality_domains() {
        assert!(compare(&Val::Bool(true), ComparisonOperator::Equal, &Val::Bool(true)).unwrap());
        assert!(compare(&Val::from("abc"), ComparisonOperator::Equal, &Val::from("abc")).unwrap());
        assert!(compare(&Val::from("abc"), ComparisonOperator::NotEqual, &Val::from("abd")).unwrap());
        // mixed kinds fall back to text
        assert!(compare(&Val::Int(5), ComparisonOperator::Equal, &Val::from("5")).unwrap());
        assert!(!compare(&Val::Bool(true), ComparisonOperator::Equal, &Val::from("yes")).unwrap());
    }

    #[test]
    fn test_simple_guard_truthiness() {
        let env = env_with(&[("empty", Val::from("")), ("zero", Val::Int(0)), ("on", Val::Bool(true))]);
        let guard = |name: &str| Expression::Simple {
            value: Param::Register(name.to_string()),
        };
        assert!(!evaluate_guard(&guard("empty"), &env).unwrap());
        assert!(!evaluate_guard(&guard("zero"), &env).unwrap());
        assert!(evaluate_guard(&guard("on"), &env).unwrap());
    }

    #[test]
    fn test_range_inclusive_from_registers() {
        let env = env_with(&[("start", Val::Int(1)), ("end", Val::Int(3))]);
        let iterable = Iterable::Range {
            range: RangeExpression {
                start: "start".into(),
                end: "end".into(),
            },
        };
        let items = evaluate_iterable(&iterable, &env, 100).unwrap();
        assert_eq!(items, vec![Val::Int(1), Val::Int(2), Val::Int(3)]);
    }

    #[test]
    fn test_range_descending_is_empty() {
        let env = Env::default();
        let iterable = Iterable::Range {
            range: RangeExpression {
                start: "5".into(),
                end: "2".into(),
            },
        };
        assert!(evaluate_iterable(&iterable, &env, 100).unwrap().is_empty());
    }

    #[test]
    fn test_range_limit() {
        let env = Env::default();
        let iterable = Iterable::Range {
            range: RangeExpression {
                start: "1".into(),
                end: "1000".into(),
            },
        };
        let err = evaluate_iterable(&iterable, &env, 10).unwrap_err();
        assert!(matches!(err, RuntimeError::IterationLimit { len: 1000, limit: 10 }));
    }

    #[test]
    fn test_range_bound_must_be_integer() {
        let env = env_with(&[("label", Val::from("x"))]);
        let range = RangeExpression {
            start: "1".into(),
            end: "label".into(),
        };
        let err = evaluate_range_bounds(&range, &env).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch(_)));

        let range = RangeExpression {
            start: "missing".into(),
            end: "3".into(),
        };
        let err = evaluate_range_bounds(&range, &env).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Resolution(ResolutionError::Identifier(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_split() {
        let env = env_with(&[("csv", Val::from("a,b,c"))]);
        let split = SplitExpression {
            source: SplitSource::Register("csv".into()),
            delimiter: ",".into(),
        };
        assert_eq!(
            evaluate_split(&split, &env).unwrap(),
            vec![Val::from("a"), Val::from("b"), Val::from("c")]
        );

        let split = SplitExpression {
            source: SplitSource::String(String::new()),
            delimiter: ",".into(),
        };
        assert!(evaluate_split(&split, &env).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_literal() {
        assert!(literal_integer(&IntegerLiteral::from(u64::MAX)).is_err());
        let huge = IntegerLiteral::new("99999999999999999999999").unwrap();
        assert!(matches!(literal_integer(&huge), Err(RuntimeError::TypeMismatch(_))));
        assert_eq!(literal_integer(&IntegerLiteral::from(42u64)).unwrap(), Val::Int(42));
    }

    #[test]
    fn test_oversized_range_bound() {
        let range = RangeExpression {
            start: "1".into(),
            end: "99999999999999999999999".into(),
        };
        let err = evaluate_range_bounds(&range, &Env::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch(_)));
    }
}
