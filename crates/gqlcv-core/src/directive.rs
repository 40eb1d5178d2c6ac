//! Directive applications attached to schema elements.
//!
//! A [`DirectiveNode`] is the decoded form of `@name(arg: literal, ...)`.
//! Turning schema text into these nodes is the host's job; this crate only
//! carries the result.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One directive application with its literal arguments in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveNode {
    pub name: String,
    #[serde(default)]
    pub arguments: IndexMap<String, ArgValue>,
}

impl DirectiveNode {
    pub fn new(name: impl Into<String>) -> Self {
        DirectiveNode {
            name: name.into(),
            arguments: IndexMap::new(),
        }
    }

    /// Adds a literal argument, replacing an earlier one with the same name.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// A literal directive argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ArgValue>),
    Object(IndexMap<String, ArgValue>),
}

impl ArgValue {
    /// Short description of the literal's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Boolean(_) => "Boolean",
            ArgValue::Int(_) => "Int",
            ArgValue::Float(_) => "Float",
            ArgValue::String(_) => "String",
            ArgValue::List(_) => "list",
            ArgValue::Object(_) => "object",
        }
    }

    /// Builds an object literal from `(name, value)` pairs.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ArgValue>,
    {
        ArgValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Boolean(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::String(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::String(v)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(v: Vec<T>) -> Self {
        ArgValue::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_argument_order() {
        let node = DirectiveNode::new("stringValue")
            .arg("maxLength", 10)
            .arg("minLength", 2);
        let names: Vec<&str> = node.arguments.keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["maxLength", "minLength"]);
    }

    #[test]
    fn untagged_json_shape() {
        let node: DirectiveNode = serde_json::from_str(
            r#"{"name":"list","arguments":{"minItems":1,"innerList":{"uniqueItems":true}}}"#,
        )
        .unwrap();
        assert_eq!(node.arguments["minItems"], ArgValue::Int(1));
        assert_eq!(
            node.arguments["innerList"],
            ArgValue::object([("uniqueItems", true)])
        );
    }

    #[test]
    fn float_literal_stays_float() {
        let value: ArgValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(value, ArgValue::Float(2.5));
        let value: ArgValue = serde_json::from_str("null").unwrap();
        assert_eq!(value, ArgValue::Null);
    }
}
