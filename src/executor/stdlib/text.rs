//! String helpers; every argument is taken by its textual rendering

use serde_json::Value as JsonValue;

use super::expect_arity;
use crate::executor::errors::DispatchError;
use crate::executor::types::Val;

pub fn concat(args: &[Val]) -> Result<Val, DispatchError> {
    Ok(Val::Str(args.iter().map(Val::render).collect()))
}

/// Character count of a string, element count of a JSON array
pub fn len(args: &[Val]) -> Result<Val, DispatchError> {
    expect_arity("len", args, 1)?;
    let n = match &args[0] {
        Val::Json(JsonValue::Array(items)) => items.len(),
        Val::Json(JsonValue::Object(map)) => map.len(),
        other => other.render().chars().count(),
    };
    i64::try_from(n)
        .map(Val::Int)
        .map_err(|_| DispatchError::failed("length does not fit in an integer"))
}

pub fn contains(args: &[Val]) -> Result<Val, DispatchError> {
    expect_arity("contains", args, 2)?;
    Ok(Val::Bool(args[0].render().contains(&args[1].render())))
}

pub fn upper(args: &[Val]) -> Result<Val, DispatchError> {
    expect_arity("upper", args, 1)?;
    Ok(Val::Str(args[0].render().to_uppercase()))
}

pub fn lower(args: &[Val]) -> Result<Val, DispatchError> {
    expect_arity("lower", args, 1)?;
    Ok(Val::Str(args[0].render().to_lowercase()))
}
