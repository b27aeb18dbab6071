use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::executor::stdlib::register_generic_functions;
use crate::executor::{Execution, FunctionRegistry, Val};
use crate::parser::semantic_validator::validate_workflow;
use crate::parser::{parse_workflow, to_source};
use crate::workflows::{load_definition, WorkflowFile};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - parse, check and run workflow scripts", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and validate a workflow
    Check {
        /// Workflow source file
        file: PathBuf,

        /// Print the parsed workflow as JSON instead of diagnostics
        #[arg(long)]
        json: bool,
    },

    /// Print a workflow in canonical form
    Fmt {
        /// Workflow source file
        file: PathBuf,
    },

    /// List the functions a workflow dispatches to
    Functions {
        /// Workflow source file
        file: PathBuf,
    },

    /// Run a workflow with the built-in generic functions
    Run {
        /// Workflow source file
        file: PathBuf,

        /// Initial register binding, NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// TOML file of initial register bindings
        #[arg(long, value_name = "FILE")]
        bindings: Option<PathBuf>,
    },
}

impl Cli {
    /// Load configuration, honoring `--config`
    pub fn load_config(&self) -> Result<Config> {
        Config::builder()
            .config_path(self.config.as_ref().map(PathBuf::from))
            .build()
    }
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Config errors surface before any command output
    let config = cli.load_config()?;
    run_command(cli.command, &config).await
}

/// Execute one subcommand against a loaded configuration
pub async fn run_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Check { file, json } => {
            let workflow_file = WorkflowFile::read(&file)?;
            let workflow = match parse_workflow(&workflow_file.source) {
                Ok(workflow) => workflow,
                Err(err) => {
                    match err.position() {
                        Some(position) => {
                            eprintln!("{}:{}: {}", file.display(), position, err.message())
                        }
                        None => eprintln!("{}: {}", file.display(), err.message()),
                    }
                    std::process::exit(1);
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&workflow)?);
                return Ok(());
            }

            let diagnostics = validate_workflow(&workflow);
            for diagnostic in &diagnostics {
                println!("{}", diagnostic);
            }
            println!(
                "{} {}: {} step(s), {} diagnostic(s)",
                workflow.name,
                workflow.version,
                workflow.steps.len(),
                diagnostics.len()
            );
        }

        Commands::Fmt { file } => {
            let workflow_file = WorkflowFile::read(&file)?;
            let definition = load_definition(&workflow_file)?;
            print!("{}", to_source(&definition.workflow));
        }

        Commands::Functions { file } => {
            let workflow_file = WorkflowFile::read(&file)?;
            let definition = load_definition(&workflow_file)?;
            for name in definition.workflow.function_names() {
                println!("{}", name);
            }
        }

        Commands::Run {
            file,
            set,
            bindings,
        } => {
            let workflow_file = WorkflowFile::read(&file)?;
            let definition = load_definition(&workflow_file)?;

            let mut initial = match &bindings {
                Some(path) => read_bindings(path)?,
                None => HashMap::new(),
            };
            for assignment in &set {
                let (name, value) = parse_assignment(assignment)?;
                initial.insert(name, value);
            }

            let mut registry = FunctionRegistry::new();
            register_generic_functions(&mut registry);

            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received Ctrl+C, cancelling run");
                    interrupt.cancel();
                }
            });

            let mut execution = Execution::new(&definition.workflow, initial, &registry)
                .with_config(config.engine.clone())
                .with_cancellation(cancel);

            match execution.run().await {
                Ok(result) => {
                    let registers: serde_json::Map<String, serde_json::Value> = result
                        .registers
                        .iter()
                        .map(|(name, value)| (name.clone(), value.to_json()))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&registers)?);
                }
                Err(err) => {
                    eprintln!("Run {} failed: {}", execution.run_id(), err);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Parse `NAME=VALUE`; integers and booleans are inferred, anything else is a string
pub fn parse_assignment(assignment: &str) -> Result<(String, Val)> {
    let Some((name, raw)) = assignment.split_once('=') else {
        bail!("Invalid binding '{}': expected NAME=VALUE", assignment);
    };
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        bail!("Invalid binding '{}': empty register name", assignment);
    }

    let value = if let Ok(n) = raw.parse::<i64>() {
        Val::Int(n)
    } else if let Ok(b) = raw.parse::<bool>() {
        Val::Bool(b)
    } else {
        Val::Str(raw.to_string())
    };
    Ok((name.to_string(), value))
}

/// Read initial bindings from a flat TOML table
pub fn read_bindings(path: &Path) -> Result<HashMap<String, Val>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bindings file {}", path.display()))?;
    let table: toml::Table = text
        .parse()
        .with_context(|| format!("Failed to parse bindings file {}", path.display()))?;

    table
        .into_iter()
        .map(|(name, value)| Ok((name, toml_to_val(value)?)))
        .collect()
}

fn toml_to_val(value: toml::Value) -> Result<Val> {
    Ok(match value {
        toml::Value::String(s) => Val::Str(s),
        toml::Value::Integer(n) => Val::Int(n),
        toml::Value::Boolean(b) => Val::Bool(b),
        other => Val::Json(serde_json::to_value(other).context("Unsupported binding value")?),
    })
}
