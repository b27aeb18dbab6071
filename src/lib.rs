pub mod cli;
pub mod config;
pub mod executor;
pub mod parser;
pub mod workflows;

// Re-export main types
pub use config::{Config, EngineConfig};
pub use executor::{
    execute, DispatchRequest, Dispatcher, Execution, ExecutionError, ExecutionResult,
    FunctionRegistry, RunState, Val, Workflow,
};
pub use parser::{parse_workflow, to_source, ParseError};
