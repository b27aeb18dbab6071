//! Workflow definitions
//!
//! Turns workflow files into parsed, content-addressed definitions a host can
//! store. Nothing is persisted here.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::executor::types::Workflow;
use crate::parser::parse_workflow;

/// A workflow file handed over by a host
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub name: String,
    pub source: String,
    pub file_path: String,
}

impl WorkflowFile {
    /// Read a file from disk; the name defaults to the file stem
    pub fn read(path: &std::path::Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow file {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            source,
            file_path: path.display().to_string(),
        })
    }
}

/// A parsed workflow plus the identity of its source
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDefinition {
    /// Name declared in the source
    pub name: String,
    /// Version declared in the source
    pub version: String,
    /// SHA-256 of the source text, lowercase hex
    pub version_hash: String,
    pub source: String,
    pub workflow: Workflow,
}

/// Parse one workflow file into a definition
pub fn load_definition(file: &WorkflowFile) -> Result<WorkflowDefinition> {
    let workflow = parse_workflow(&file.source).with_context(|| {
        format!(
            "Failed to parse workflow '{}' from {}",
            file.name, file.file_path
        )
    })?;

    let version_hash = hash_source(&file.source);
    info!(
        workflow = %workflow.name,
        version = %workflow.version,
        hash = &version_hash[..8],
        steps = workflow.steps.len(),
        "loaded workflow definition"
    );

    Ok(WorkflowDefinition {
        name: workflow.name.clone(),
        version: workflow.version.clone(),
        version_hash,
        source: file.source.clone(),
        workflow,
    })
}

/// Parse several files, stopping at the first failure
pub fn load_definitions(files: &[WorkflowFile]) -> Result<Vec<WorkflowDefinition>> {
    files.iter().map(load_definition).collect()
}

/// Hash workflow source using SHA256
pub fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}
