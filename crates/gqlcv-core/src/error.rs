//! Core error types for gqlcv-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the failure modes of building a schema type graph.

use crate::type_id::TypeId;
use thiserror::Error;

/// Core errors produced by the gqlcv-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Attempting to register a type name that already exists in the graph.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// A TypeId was not found in the schema graph.
    #[error("type not found: TypeId({id})", id = id.0)]
    TypeNotFound { id: TypeId },

    /// A type was declared as a forward reference but never defined.
    #[error("type '{name}' was declared but never defined")]
    UndefinedType { name: String },

    /// A type that is already defined was defined a second time.
    #[error("type '{name}' is already defined")]
    AlreadyDefined { name: String },
}
