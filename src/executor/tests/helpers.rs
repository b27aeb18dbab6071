//! Test helpers for executor tests
//!
//! Common utilities for parsing workflows and recording dispatcher traffic

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::executor::{
    execute, DispatchError, DispatchRequest, Dispatcher, ExecutionError, ExecutionResult, Val,
    Workflow,
};
use crate::parser::parse_workflow;

/// Parse workflow source, then serialize/deserialize
pub fn parse(source: &str) -> Workflow {
    let workflow = parse_workflow(source).expect("Parse workflow failed");

    let json = serde_json::to_string(&workflow).expect("Workflow serialization failed");
    serde_json::from_str(&json).expect("Workflow deserialization failed")
}

/// Parse and run against a fresh recording dispatcher
pub async fn run(
    source: &str,
    bindings: HashMap<String, Val>,
) -> (Result<ExecutionResult, ExecutionError>, RecordingDispatcher) {
    run_with(source, bindings, RecordingDispatcher::new()).await
}

pub async fn run_with(
    source: &str,
    bindings: HashMap<String, Val>,
    dispatcher: RecordingDispatcher,
) -> (Result<ExecutionResult, ExecutionError>, RecordingDispatcher) {
    let workflow = parse(source);
    let result = execute(&workflow, bindings, &dispatcher).await;
    (result, dispatcher)
}

/* ===================== Recording Dispatcher ===================== */

/// Dispatcher that records every request in order.
///
/// Unless configured otherwise, a call answers with its own rendering, e.g.
/// `f(a, 1)`.
#[derive(Default)]
pub struct RecordingDispatcher {
    calls: Mutex<Vec<DispatchRequest>>,
    responses: HashMap<String, Val>,
    failures: HashMap<String, String>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `name` with `value`
    pub fn respond(mut self, name: &str, value: impl Into<Val>) -> Self {
        self.responses.insert(name.to_string(), value.into());
        self
    }

    /// Fail every call to `name`
    pub fn fail_on(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }

    /// Cancel `token` while serving a call to `name`
    pub fn cancel_on(mut self, name: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((name.to_string(), token));
        self
    }

    pub fn calls(&self) -> Vec<DispatchRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls rendered as `name(args)`
    pub fn rendered(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn invoke(&self, request: DispatchRequest) -> Result<Val, DispatchError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some((name, token)) = &self.cancel_on {
            if *name == request.name {
                token.cancel();
            }
        }
        if let Some(message) = self.failures.get(&request.name) {
            return Err(DispatchError::failed(message.clone()));
        }
        Ok(self
            .responses
            .get(&request.name)
            .cloned()
            .unwrap_or_else(|| Val::Str(request.to_string())))
    }
}
