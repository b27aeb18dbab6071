//! Generic host functions
//!
//! A small, side-effect-free function set for the CLI `run` command and tests.
//! Real deployments register their own tools on a [`FunctionRegistry`].

pub mod math;
pub mod text;

use tracing::info;

use super::dispatcher::FunctionRegistry;
use super::errors::DispatchError;
use super::types::Val;

/// Names installed by [`register_generic_functions`]
pub const GENERIC_FUNCTIONS: &[&str] = &["add", "concat", "contains", "len", "lower", "print", "upper"];

/// Install the generic functions into `registry`
pub fn register_generic_functions(registry: &mut FunctionRegistry) -> &mut FunctionRegistry {
    registry
        .register_fn("add", math::add)
        .register_fn("concat", text::concat)
        .register_fn("contains", text::contains)
        .register_fn("len", text::len)
        .register_fn("lower", text::lower)
        .register_fn("upper", text::upper)
        .register_fn("print", print)
}

/// Log the arguments and return them joined by spaces
fn print(args: &[Val]) -> Result<Val, DispatchError> {
    let line = args.iter().map(Val::render).collect::<Vec<_>>().join(" ");
    info!(target: "cadence::print", "{}", line);
    Ok(Val::Str(line))
}

pub(crate) fn expect_arity(function: &str, args: &[Val], arity: usize) -> Result<(), DispatchError> {
    if args.len() != arity {
        return Err(DispatchError::invalid_arguments(
            function,
            format!("expected {} argument(s), got {}", arity, args.len()),
        ));
    }
    Ok(())
}
