//! Integer helpers

use super::expect_arity;
use crate::executor::errors::DispatchError;
use crate::executor::types::Val;

/// `add(a, b)`: checked integer sum
pub fn add(args: &[Val]) -> Result<Val, DispatchError> {
    expect_arity("add", args, 2)?;
    let (Some(a), Some(b)) = (args[0].as_int(), args[1].as_int()) else {
        return Err(DispatchError::invalid_arguments(
            "add",
            format!("expected two integers, got {} and {}", args[0].type_name(), args[1].type_name()),
        ));
    };
    a.checked_add(b)
        .map(Val::Int)
        .ok_or_else(|| DispatchError::failed(format!("add({}, {}) overflows", a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        assert_eq!(add(&[Val::Int(2), Val::Int(-5)]).unwrap(), Val::Int(-3));
        assert!(add(&[Val::Int(i64::MAX), Val::Int(1)]).is_err());
        assert!(matches!(
            add(&[Val::from("2"), Val::Int(1)]),
            Err(DispatchError::InvalidArguments { .. })
        ));
    }
}
