//! Runtime error taxonomy
//!
//! Every failure aborts the run. The first error is wrapped in an
//! [`ExecutionError`] carrying the step name and statement path where it
//! happened.

use thiserror::Error;

use super::types::StatementPath;

/// An identifier or register could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("unresolved identifier '{0}'")]
    Identifier(String),

    #[error("register '${0}' is not set")]
    Register(String),
}

/// Operands live in incompatible domains
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type mismatch: {message}")]
pub struct TypeMismatchError {
    pub message: String,
}

impl TypeMismatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by the external call dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid arguments for '{function}': {message}")]
    InvalidArguments { function: String, message: String },

    #[error("{0}")]
    Failed(String),
}

/// Host errors keep their full context chain as text
impl From<anyhow::Error> for DispatchError {
    fn from(error: anyhow::Error) -> Self {
        DispatchError::Failed(format!("{:#}", error))
    }
}

impl DispatchError {
    pub fn failed(message: impl Into<String>) -> Self {
        DispatchError::Failed(message.into())
    }

    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Any error that fails a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),

    #[error("call to '{function}' failed: {source}")]
    Dispatch {
        function: String,
        #[source]
        source: DispatchError,
    },

    #[error("loop over {len} items exceeds the limit of {limit}")]
    IterationLimit { len: usize, limit: usize },

    #[error("execution cancelled")]
    Cancelled,
}

impl RuntimeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RuntimeError::Cancelled)
    }
}

/// A failed run: the first unrecovered error plus where it happened
#[derive(Debug, Clone, PartialEq, Error)]
#[error("step '{step}' at statement {path}: {source}")]
pub struct ExecutionError {
    pub step: String,
    pub path: StatementPath,
    #[source]
    pub source: RuntimeError,
}

impl ExecutionError {
    pub fn kind(&self) -> &RuntimeError {
        &self.source
    }
}

/// Result alias used by evaluation helpers
pub type EvalResult<T> = Result<T, RuntimeError>;
