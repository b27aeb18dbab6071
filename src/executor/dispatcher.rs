//! External call boundary
//!
//! The engine never executes functions itself. Every command and `call`
//! becomes a [`DispatchRequest`] handed to a host-supplied [`Dispatcher`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::DispatchError;
use super::types::Val;

/// How a call was written in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// `name(args)`
    Command,
    /// `call name(args)`
    External,
}

/// A fully resolved call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub kind: CallKind,
    pub name: String,
    pub args: Vec<Val>,
}

impl fmt::Display for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.render()).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

/// Host boundary that executes named functions.
///
/// Implementations shared across concurrent runs must be reentrant. Retry and
/// timeout policy belong here, not in the engine.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn invoke(&self, request: DispatchRequest) -> Result<Val, DispatchError>;
}

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for &D {
    async fn invoke(&self, request: DispatchRequest) -> Result<Val, DispatchError> {
        (**self).invoke(request).await
    }
}

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    async fn invoke(&self, request: DispatchRequest) -> Result<Val, DispatchError> {
        (**self).invoke(request).await
    }
}

/* ===================== Function Registry ===================== */

/// Synchronous host function
pub type HostFn = Arc<dyn Fn(&[Val]) -> Result<Val, DispatchError> + Send + Sync>;

#[derive(Clone)]
enum Handler {
    Sync(HostFn),
    Async(Arc<dyn Dispatcher>),
}

/// Name → handler map usable as a [`Dispatcher`].
///
/// Commands and external calls share one namespace.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous function
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Val]) -> Result<Val, DispatchError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Handler::Sync(Arc::new(f)));
        self
    }

    /// Register an async handler; it receives the full request
    pub fn register<D>(&mut self, name: impl Into<String>, handler: D) -> &mut Self
    where
        D: Dispatcher + 'static,
    {
        self.handlers
            .insert(name.into(), Handler::Async(Arc::new(handler)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl Dispatcher for FunctionRegistry {
    async fn invoke(&self, request: DispatchRequest) -> Result<Val, DispatchError> {
        match self.handlers.get(&request.name) {
            Some(Handler::Sync(f)) => f(&request.args),
            Some(Handler::Async(d)) => d.invoke(request).await,
            None => Err(DispatchError::UnknownFunction(request.name)),
        }
    }
}
