//! Register store and loop-variable overlay
//!
//! Each run owns exactly one [`Env`]. Loop variables live in a push/pop stack
//! of binding frames layered over the register store, so restoring the outer
//! view after an iteration is just a pop.

use std::collections::{BTreeMap, HashMap};

use super::errors::ResolutionError;
use super::types::Val;

/* ===================== Register Store ===================== */

/// Per-run mapping of register names to values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterStore {
    registers: HashMap<String, Val>,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Val> {
        self.registers.get(name)
    }

    /// Insert or overwrite
    pub fn set(&mut self, name: impl Into<String>, value: Val) {
        self.registers.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Sorted copy of all registers
    pub fn snapshot(&self) -> BTreeMap<String, Val> {
        self.registers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<HashMap<String, Val>> for RegisterStore {
    fn from(registers: HashMap<String, Val>) -> Self {
        Self { registers }
    }
}

impl FromIterator<(String, Val)> for RegisterStore {
    fn from_iter<I: IntoIterator<Item = (String, Val)>>(iter: I) -> Self {
        Self {
            registers: iter.into_iter().collect(),
        }
    }
}

/* ===================== Loop Scopes ===================== */

/// Stack of loop-variable bindings, innermost last
#[derive(Debug, Clone, Default)]
pub struct LoopScopes {
    frames: Vec<(String, Val)>,
}

impl LoopScopes {
    pub fn push(&mut self, name: impl Into<String>, value: Val) {
        self.frames.push((name.into(), value));
    }

    pub fn pop(&mut self) -> Option<(String, Val)> {
        self.frames.pop()
    }

    /// Innermost binding for `name`
    pub fn lookup(&self, name: &str) -> Option<&Val> {
        self.frames
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/* ===================== Environment ===================== */

/// Everything identifiers resolve against during one run
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub registers: RegisterStore,
    pub scopes: LoopScopes,
}

impl Env {
    pub fn new(registers: RegisterStore) -> Self {
        Self {
            registers,
            scopes: LoopScopes::default(),
        }
    }

    /// Bare identifier: innermost loop variable, then register
    pub fn resolve_identifier(&self, name: &str) -> Result<Val, ResolutionError> {
        self.scopes
            .lookup(name)
            .or_else(|| self.registers.get(name))
            .cloned()
            .ok_or_else(|| ResolutionError::Identifier(name.to_string()))
    }

    /// `$name`: registers only
    pub fn resolve_register(&self, name: &str) -> Result<Val, ResolutionError> {
        self.registers
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::Register(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut store = RegisterStore::new();
        store.set("R1", Val::Int(1));
        store.set("R1", Val::from("two"));
        assert_eq!(store.get("R1"), Some(&Val::from("two")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_loop_scope_shadows_register_until_popped() {
        let mut env = Env::new(RegisterStore::from_iter([("x".to_string(), Val::Int(1))]));
        env.scopes.push("x", Val::Int(2));
        assert_eq!(env.resolve_identifier("x").unwrap(), Val::Int(2));
        // `$x` ignores loop variables
        assert_eq!(env.resolve_register("x").unwrap(), Val::Int(1));
        env.scopes.pop();
        assert_eq!(env.resolve_identifier("x").unwrap(), Val::Int(1));
    }

    #[test]
    fn test_innermost_binding_wins() {
        let mut env = Env::default();
        env.scopes.push("i", Val::Int(1));
        env.scopes.push("i", Val::Int(9));
        assert_eq!(env.resolve_identifier("i").unwrap(), Val::Int(9));
    }

    #[test]
    fn test_unresolved() {
        let env = Env::default();
        assert_eq!(
            env.resolve_identifier("nope"),
            Err(ResolutionError::Identifier("nope".into()))
        );
        assert_eq!(
            env.resolve_register("nope"),
            Err(ResolutionError::Register("nope".into()))
        );
    }
}
