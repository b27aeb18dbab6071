//! Runtime value types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Runtime value type
///
/// `Json` values only ever come back from the dispatcher; literals in source
/// produce the other three kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Str(String),
    Int(i64),
    Bool(bool),
    Json(JsonValue),
}

impl Val {
    /// Truthiness for bare guards: `true`, non-zero integers and non-empty strings
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Int(n) => *n != 0,
            Val::Str(s) => !s.is_empty(),
            Val::Json(json) => match json {
                JsonValue::Null => false,
                JsonValue::Bool(b) => *b,
                JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
                JsonValue::String(s) => !s.is_empty(),
                JsonValue::Array(items) => !items.is_empty(),
                JsonValue::Object(map) => !map.is_empty(),
            },
        }
    }

    /// Collapse JSON scalars onto the matching primitive kind
    pub fn normalized(&self) -> Val {
        match self {
            Val::Json(JsonValue::Bool(b)) => Val::Bool(*b),
            Val::Json(JsonValue::String(s)) => Val::Str(s.clone()),
            Val::Json(JsonValue::Number(n)) if n.is_i64() => match n.as_i64() {
                Some(i) => Val::Int(i),
                None => self.clone(),
            },
            other => other.clone(),
        }
    }

    /// Integer view, accepting JSON integers
    pub fn as_int(&self) -> Option<i64> {
        match self.normalized() {
            Val::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Textual rendering used for string comparison and splitting
    pub fn render(&self) -> String {
        match self {
            Val::Str(s) => s.clone(),
            Val::Int(n) => n.to_string(),
            Val::Bool(b) => b.to_string(),
            Val::Json(JsonValue::String(s)) => s.clone(),
            Val::Json(json) => json.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Str(_) => "string",
            Val::Int(_) => "integer",
            Val::Bool(_) => "boolean",
            Val::Json(_) => "json",
        }
    }

    /// Convert to plain JSON (for result output)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Val::Str(s) => JsonValue::String(s.clone()),
            Val::Int(n) => JsonValue::from(*n),
            Val::Bool(b) => JsonValue::Bool(*b),
            Val::Json(json) => json.clone(),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(s)
    }
}

impl From<i64> for Val {
    fn from(n: i64) -> Self {
        Val::Int(n)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<JsonValue> for Val {
    fn from(json: JsonValue) -> Self {
        Val::Json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(Val::Bool(true).is_truthy());
        assert!(!Val::Bool(false).is_truthy());
        assert!(Val::Int(-2).is_truthy());
        assert!(!Val::Int(0).is_truthy());
        assert!(Val::from("x").is_truthy());
        assert!(!Val::from("").is_truthy());
        assert!(!Val::Json(json!(null)).is_truthy());
        assert!(Val::Json(json!({"a": 1})).is_truthy());
        assert!(!Val::Json(json!([])).is_truthy());
    }

    #[test]
    fn test_normalized_json_scalars() {
        assert_eq!(Val::Json(json!(7)).normalized(), Val::Int(7));
        assert_eq!(Val::Json(json!("7")).normalized(), Val::Str("7".into()));
        assert_eq!(Val::Json(json!(true)).normalized(), Val::Bool(true));
        assert_eq!(Val::Json(json!(1.5)).normalized(), Val::Json(json!(1.5)));
    }

    #[test]
    fn test_render() {
        assert_eq!(Val::Int(-4).render(), "-4");
        assert_eq!(Val::Json(json!("plain")).render(), "plain");
        assert_eq!(Val::Json(json!({"k": [1]})).render(), r#"{"k":[1]}"#);
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(Val::Int(3)).unwrap();
        assert_eq!(json, json!({"t": "Int", "v": 3}));
    }
}
