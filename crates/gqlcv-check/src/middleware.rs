//! Argument validation as resolver middleware.
//!
//! The execution engine owns resolution; this module only composes. A
//! [`Validated`] resolver runs [`validate_arguments`] for its field and
//! calls the wrapped resolver only when every argument passes. Resolvers
//! are never patched in place.

use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use gqlcv_core::{FieldKey, Value};

use crate::compile::CompiledIndex;
use crate::diagnostics::ValidationError;
use crate::validate::validate_arguments;

/// A field resolver as seen by the middleware.
pub trait Resolver {
    type Output;
    type Error;

    fn resolve(&self, args: &IndexMap<String, Value>) -> Result<Self::Output, Self::Error>;
}

/// Failure of a guarded resolver.
#[derive(Debug, thiserror::Error)]
pub enum GuardError<E> {
    /// Rejected before the resolver ran.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("resolver failed: {0}")]
    Resolver(E),
}

/// Adapts a closure into a [`Resolver`].
pub struct FnResolver<F, T, E> {
    f: F,
    _output: PhantomData<fn() -> Result<T, E>>,
}

pub fn resolver_fn<F, T, E>(f: F) -> FnResolver<F, T, E>
where
    F: Fn(&IndexMap<String, Value>) -> Result<T, E>,
{
    FnResolver {
        f,
        _output: PhantomData,
    }
}

impl<F, T, E> Resolver for FnResolver<F, T, E>
where
    F: Fn(&IndexMap<String, Value>) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn resolve(&self, args: &IndexMap<String, Value>) -> Result<T, E> {
        (self.f)(args)
    }
}

/// A resolver guarded by the compiled constraints of its field.
#[derive(Clone)]
pub struct Validated<R> {
    index: Arc<CompiledIndex>,
    field: FieldKey,
    inner: R,
}

impl<R: Resolver> Validated<R> {
    pub fn new(index: Arc<CompiledIndex>, field: FieldKey, inner: R) -> Self {
        Validated { index, field, inner }
    }

    pub fn field(&self) -> &FieldKey {
        &self.field
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Resolver> Resolver for Validated<R> {
    type Output = R::Output;
    type Error = GuardError<R::Error>;

    fn resolve(&self, args: &IndexMap<String, Value>) -> Result<Self::Output, Self::Error> {
        validate_arguments(&self.index, &self.field, args)?;
        self.inner.resolve(args).map_err(GuardError::Resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::catalog::DirectiveCatalog;
    use crate::compile::compile_constraints;
    use crate::options::CompileOptions;
    use gqlcv_core::{
        DirectiveNode, FieldDef, InputValueDef, NamedType, ObjectDef, SchemaGraph, TypeId,
        TypeKind, TypeRef,
    };

    fn index() -> Arc<CompiledIndex> {
        let mut schema = SchemaGraph::new();
        schema
            .register_named(NamedType::new(
                "Query",
                TypeKind::Object(ObjectDef::new().field(
                    "echo",
                    FieldDef::new(TypeRef::named(TypeId::STRING)).argument(
                        "text",
                        InputValueDef::new(TypeRef::named(TypeId::STRING))
                            .directive(DirectiveNode::new("stringValue").arg("maxLength", 3)),
                    ),
                )),
            ))
            .unwrap();
        let catalog = DirectiveCatalog::standard().unwrap();
        Arc::new(compile_constraints(&schema, &catalog, &CompileOptions::default()).unwrap())
    }

    fn args(text: &str) -> IndexMap<String, Value> {
        IndexMap::from([("text".to_string(), Value::from(text))])
    }

    #[test]
    fn resolver_runs_after_validation_passes() {
        let guarded = Validated::new(
            index(),
            FieldKey::new("Query", "echo"),
            resolver_fn(|args: &IndexMap<String, Value>| {
                Ok::<_, String>(args["text"].as_str().unwrap_or_default().to_uppercase())
            }),
        );
        assert_eq!(guarded.resolve(&args("abc")).unwrap(), "ABC");
    }

    #[test]
    fn resolver_is_skipped_on_violation() {
        let calls = Cell::new(0);
        let guarded = Validated::new(
            index(),
            FieldKey::new("Query", "echo"),
            resolver_fn(|_: &IndexMap<String, Value>| {
                calls.set(calls.get() + 1);
                Ok::<_, String>(())
            }),
        );
        let err = guarded.resolve(&args("abcd")).unwrap_err();
        assert!(matches!(err, GuardError::Invalid(_)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn resolver_errors_pass_through() {
        let guarded = Validated::new(
            index(),
            FieldKey::new("Query", "echo"),
            resolver_fn(|_: &IndexMap<String, Value>| Err::<(), _>("backend down".to_string())),
        );
        let err = guarded.resolve(&args("ok")).unwrap_err();
        assert_eq!(err.to_string(), "resolver failed: backend down");
    }
}
