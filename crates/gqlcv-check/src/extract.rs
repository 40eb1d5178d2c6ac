//! Constraint extraction for a single schema element.
//!
//! Decodes every catalog directive attached to one element (scalar
//! definition, input field, field argument) into a local [`ConstraintMap`]
//! and checks that each directive is legal there: the right location, a
//! compatible named type, and an `innerList` chain as deep as the declared
//! list nesting.

use indexmap::IndexMap;

use gqlcv_core::{ArgValue, CoreError, DirectiveNode, SchemaGraph, TypeId, TypeKind, TypeRef};

use crate::catalog::{ArgType, ArgumentDefinition, DirectiveCatalog, DirectiveDefinition, DirectiveLocation};
use crate::constraint::{ConstraintMap, ConstraintName, ConstraintSet, ConstraintValue, DirectiveKey, Pattern};
use crate::diagnostics::SchemaDirectiveError;
use crate::options::{family, CompileOptions};
use crate::predicate::check_declared;

/// What an element's directives are checked against.
#[derive(Debug, Clone, Copy)]
pub enum ElementType<'a> {
    /// A field or argument with a declared (possibly wrapped) type.
    Declared(&'a TypeRef),
    /// The definition of a scalar itself.
    ScalarDefinition(TypeId),
}

/// One annotated schema element.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    /// Schema coordinate used in diagnostics, e.g. `Query.books(title:)`.
    pub coordinate: String,
    pub location: DirectiveLocation,
    pub directives: &'a [DirectiveNode],
    pub ty: ElementType<'a>,
}

pub struct Extractor<'a> {
    catalog: &'a DirectiveCatalog,
    schema: &'a SchemaGraph,
    options: &'a CompileOptions,
}

impl<'a> Extractor<'a> {
    pub fn new(
        catalog: &'a DirectiveCatalog,
        schema: &'a SchemaGraph,
        options: &'a CompileOptions,
    ) -> Self {
        Extractor {
            catalog,
            schema,
            options,
        }
    }

    /// Decodes the element's constraint directives into a local map.
    ///
    /// Directives outside the catalog are skipped.
    pub fn extract(&self, element: &Element<'_>) -> Result<ConstraintMap, SchemaDirectiveError> {
        let mut map = ConstraintMap::new();
        for node in element.directives {
            let Some(def) = self.catalog.resolve(&node.name) else {
                tracing::trace!(
                    directive = %node.name,
                    coordinate = %element.coordinate,
                    "ignoring directive outside the constraint catalog"
                );
                continue;
            };
            if !def.is_legal_on(element.location) {
                return Err(SchemaDirectiveError::MisplacedDirective {
                    coordinate: element.coordinate.clone(),
                    directive: def.key,
                    location: element.location,
                });
            }

            let set = decode_arguments(def, &node.arguments, &element.coordinate)?;
            self.check_applicable(def.key, &set, element)?;
            map.insert(def.key, set);
        }
        Ok(map)
    }

    fn check_applicable(
        &self,
        key: DirectiveKey,
        set: &ConstraintSet,
        element: &Element<'_>,
    ) -> Result<(), SchemaDirectiveError> {
        let (named, depth) = match element.ty {
            ElementType::Declared(ty) => (ty.named_type(), ty.list_depth()),
            ElementType::ScalarDefinition(id) => (id, 0),
        };
        let ty = self
            .schema
            .get(named)
            .ok_or(CoreError::TypeNotFound { id: named })?;

        if key == DirectiveKey::List {
            if depth == 0 {
                return Err(SchemaDirectiveError::NonListType {
                    coordinate: element.coordinate.clone(),
                    type_name: ty.name.clone(),
                });
            }
            let expected = set.list_depth();
            if expected != depth {
                return Err(SchemaDirectiveError::ListDepthMismatch {
                    coordinate: element.coordinate.clone(),
                    expected,
                    actual: depth,
                });
            }
            return Ok(());
        }

        let accepts = match &ty.kind {
            TypeKind::Scalar(scalar) => self.options.scalar_accepts(&ty.name, scalar, key),
            _ => false,
        };
        if accepts {
            Ok(())
        } else {
            Err(SchemaDirectiveError::IncompatibleType {
                coordinate: element.coordinate.clone(),
                directive: key,
                type_name: ty.name.clone(),
                expected: family(key),
            })
        }
    }
}

/// Decodes directive arguments into a [`ConstraintSet`] in the definition's
/// argument order, applying defaults and range checks.
///
/// Explicit `null` arguments count as absent.
pub fn decode_arguments(
    def: &DirectiveDefinition,
    args: &IndexMap<String, ArgValue>,
    coordinate: &str,
) -> Result<ConstraintSet, SchemaDirectiveError> {
    if let Some(unknown) = args.keys().find(|name| def.argument(name).is_none()) {
        return Err(SchemaDirectiveError::UnknownArgument {
            coordinate: coordinate.to_string(),
            directive: def.key,
            argument: unknown.clone(),
        });
    }

    let mut set = ConstraintSet::new();
    for arg in &def.arguments {
        let literal = match args.get(arg.name.as_str()).or(arg.default.as_ref()) {
            None | Some(ArgValue::Null) => continue,
            Some(literal) => literal,
        };
        let value = decode_value(def, arg, literal, coordinate)?;
        check_declared(arg.name, &value).map_err(|reason| SchemaDirectiveError::InvalidArgument {
            coordinate: coordinate.to_string(),
            directive: def.key,
            argument: arg.name,
            reason,
        })?;
        set.push(arg.name, value);
    }
    Ok(set)
}

fn decode_value(
    def: &DirectiveDefinition,
    arg: &ArgumentDefinition,
    literal: &ArgValue,
    coordinate: &str,
) -> Result<ConstraintValue, SchemaDirectiveError> {
    let wrong_type = || SchemaDirectiveError::WrongArgumentType {
        coordinate: coordinate.to_string(),
        directive: def.key,
        argument: arg.name,
        expected: arg.ty,
        actual: literal.type_name(),
    };

    // Single values coerce to one-element lists, as list inputs do.
    let value = match (arg.ty, literal) {
        (ArgType::Int, ArgValue::Int(i)) => ConstraintValue::Int(*i),
        (ArgType::Float, ArgValue::Int(i)) => ConstraintValue::Float(*i as f64),
        (ArgType::Float, ArgValue::Float(f)) => ConstraintValue::Float(*f),
        (ArgType::String, ArgValue::String(s)) if arg.name == ConstraintName::Regex => {
            let pattern = Pattern::new(s).map_err(|e| SchemaDirectiveError::InvalidArgument {
                coordinate: coordinate.to_string(),
                directive: def.key,
                argument: arg.name,
                reason: format!("is not a valid pattern: {e}"),
            })?;
            ConstraintValue::Pattern(pattern)
        }
        (ArgType::String, ArgValue::String(s)) => ConstraintValue::String(s.clone()),
        (ArgType::Boolean, ArgValue::Boolean(b)) => ConstraintValue::Boolean(*b),
        (ArgType::FloatList, ArgValue::List(items)) => ConstraintValue::FloatList(
            items
                .iter()
                .map(|item| match item {
                    ArgValue::Int(i) => Ok(*i as f64),
                    ArgValue::Float(f) => Ok(*f),
                    _ => Err(wrong_type()),
                })
                .collect::<Result<_, _>>()?,
        ),
        (ArgType::FloatList, ArgValue::Int(i)) => ConstraintValue::FloatList(vec![*i as f64]),
        (ArgType::FloatList, ArgValue::Float(f)) => ConstraintValue::FloatList(vec![*f]),
        (ArgType::StringList, ArgValue::List(items)) => ConstraintValue::StringList(
            items
                .iter()
                .map(|item| match item {
                    ArgValue::String(s) => Ok(s.clone()),
                    _ => Err(wrong_type()),
                })
                .collect::<Result<_, _>>()?,
        ),
        (ArgType::StringList, ArgValue::String(s)) => ConstraintValue::StringList(vec![s.clone()]),
        // `_ListConstraints` has the same shape as the directive owning it.
        (ArgType::ListConstraints, ArgValue::Object(fields)) => {
            ConstraintValue::Nested(Box::new(decode_arguments(def, fields, coordinate)?))
        }
        _ => return Err(wrong_type()),
    };
    Ok(value)
}
