//! Compile-time and validation-time error types.
//!
//! [`SchemaDirectiveError`] aborts schema compilation and names the schema
//! coordinate (`Type.field(arg:)`) at fault. [`ValidationError`] is scoped
//! to one field invocation and carries a [`ValuePath`] to the offending
//! sub-value plus enough context for a host to build its own error envelope.

use std::fmt;

use serde::{Serialize, Serializer};

use gqlcv_core::{CoreError, Value, ValueKind};

use crate::catalog::{ArgType, DirectiveLocation};
use crate::constraint::{ConstraintName, ConstraintValue, DirectiveKey};

/// A schema-construction failure caused by constraint directives.
#[derive(Debug, thiserror::Error)]
pub enum SchemaDirectiveError {
    /// A value directive on an element whose named type cannot hold that
    /// kind of value.
    #[error("{coordinate}: {directive} can't be applied to type '{type_name}', expected a {expected} scalar")]
    IncompatibleType {
        coordinate: String,
        directive: DirectiveKey,
        type_name: String,
        expected: &'static str,
    },

    #[error("{coordinate}: @list can't be applied to non-list type '{type_name}'")]
    NonListType {
        coordinate: String,
        type_name: String,
    },

    /// The `innerList` chain and the declared list nesting disagree.
    #[error("{coordinate}: @list directive expects list of depth {expected}, but got {actual}")]
    ListDepthMismatch {
        coordinate: String,
        expected: usize,
        actual: usize,
    },

    #[error("{coordinate}: {directive} is not allowed on {location}")]
    MisplacedDirective {
        coordinate: String,
        directive: DirectiveKey,
        location: DirectiveLocation,
    },

    #[error("{coordinate}: unknown argument '{argument}' for {directive}")]
    UnknownArgument {
        coordinate: String,
        directive: DirectiveKey,
        argument: String,
    },

    #[error("{coordinate}: {directive}({argument}:) expects {expected}, got {actual}")]
    WrongArgumentType {
        coordinate: String,
        directive: DirectiveKey,
        argument: ConstraintName,
        expected: ArgType,
        actual: &'static str,
    },

    /// A directive argument outside its legal range, e.g. a negative
    /// `minLength` or a `regex` that does not compile.
    #[error("{coordinate}: {directive}({argument}:) {reason}")]
    InvalidArgument {
        coordinate: String,
        directive: DirectiveKey,
        argument: ConstraintName,
        reason: String,
    },

    /// The directive catalog itself is malformed.
    #[error("invalid directive catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// One step from a value to one of its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a sub-value inside an argument, rendered as `arg.prop[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn argument(name: &str) -> Self {
        ValuePath(vec![PathSegment::Key(name.to_string())])
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for ValuePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A supplied argument value that violates its compiled constraints.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// The value's kind has no constraint key, but the position is
    /// constrained for other kinds.
    #[error("{path}: got {got}, expected {}", .expected.join(","))]
    KindMismatch {
        path: ValuePath,
        got: ValueKind,
        expected: Vec<&'static str>,
    },

    /// A specific constraint failed.
    #[error("{path}: {message}")]
    ConstraintViolation {
        path: ValuePath,
        directive: DirectiveKey,
        constraint: ConstraintName,
        declared: ConstraintValue,
        actual: Value,
        message: String,
    },
}

impl ValidationError {
    pub fn path(&self) -> &ValuePath {
        match self {
            ValidationError::KindMismatch { path, .. } => path,
            ValidationError::ConstraintViolation { path, .. } => path,
        }
    }

    /// The failing constraint, `None` for kind mismatches.
    pub fn constraint(&self) -> Option<ConstraintName> {
        match self {
            ValidationError::KindMismatch { .. } => None,
            ValidationError::ConstraintViolation { constraint, .. } => Some(*constraint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_path_rendering() {
        let mut path = ValuePath::argument("filter");
        path.push(PathSegment::Key("tags".into()));
        path.push(PathSegment::Index(2));
        assert_eq!(path.to_string(), "filter.tags[2]");
        path.pop();
        path.pop();
        assert_eq!(path.to_string(), "filter");
        assert_eq!(ValuePath::root().to_string(), "$");
    }

    #[test]
    fn kind_mismatch_message() {
        let err = ValidationError::KindMismatch {
            path: ValuePath::argument("limit"),
            got: ValueKind::String,
            expected: vec!["number"],
        };
        insta::assert_snapshot!(err.to_string(), @"limit: got string, expected number");
    }

    #[test]
    fn violation_serializes_for_host_envelopes() {
        let err = ValidationError::ConstraintViolation {
            path: ValuePath::argument("title"),
            directive: DirectiveKey::StringValue,
            constraint: ConstraintName::MinLength,
            declared: ConstraintValue::Int(5),
            actual: Value::from("acde"),
            message: "\"acde\" is shorter than minLength 5".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "constraintViolation");
        assert_eq!(json["path"], "title");
        assert_eq!(json["directive"], "@stringValue");
        assert_eq!(json["constraint"], "minLength");
        assert_eq!(json["declared"], 5);
        assert_eq!(json["actual"], "acde");
    }
}
