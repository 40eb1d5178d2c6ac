//! Declarative value constraints for typed API schema inputs.
//!
//! Constraint directives (`@numberValue`, `@stringValue`, `@list`) attached
//! to scalars, input fields and field arguments are compiled once per
//! schema by [`compile_constraints`] into an immutable [`CompiledIndex`].
//! [`validate_arguments`] checks one field invocation's arguments against
//! that index before the field resolves; [`Validated`] packages that as
//! resolver middleware.

pub mod catalog;
pub mod compile;
pub mod constraint;
pub mod diagnostics;
pub mod extract;
pub mod middleware;
pub mod options;
pub mod predicate;
pub mod reporter;
pub mod validate;

pub use catalog::{append_constraints_sdl, DirectiveCatalog, DirectiveLocation, CONSTRAINTS_SDL};
pub use compile::{compile_constraints, CompiledIndex};
pub use constraint::{ConstraintMap, ConstraintName, ConstraintSet, ConstraintValue, DirectiveKey};
pub use diagnostics::{PathSegment, SchemaDirectiveError, ValidationError, ValuePath};
pub use middleware::{resolver_fn, FnResolver, GuardError, Resolver, Validated};
pub use options::CompileOptions;
pub use validate::{validate, validate_arguments};
