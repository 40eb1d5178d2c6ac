//! The directive catalog: the closed set of constraint directives.
//!
//! [`DirectiveCatalog::standard`] defines `@numberValue`, `@stringValue` and
//! `@list` and self-checks them once. The catalog is an ordinary immutable
//! value handed to the compiler by reference; there is no global registry.
//!
//! [`CONSTRAINTS_SDL`] is the same vocabulary as schema text, for hosts that
//! build their type graph from SDL and need the directives to parse.

use std::fmt;

use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};

use gqlcv_core::ArgValue;

use crate::constraint::{ConstraintName, DirectiveKey};
use crate::diagnostics::SchemaDirectiveError;
use crate::extract::decode_arguments;

/// Schema text declaring the constraint directives.
pub const CONSTRAINTS_SDL: &str = r#"
directive @numberValue(
  min: Float
  max: Float
  exclusiveMax: Float
  exclusiveMin: Float
  oneOf: [Float]
  equals: Float
  multipleOf: Float
) on FIELD_DEFINITION | INPUT_FIELD_DEFINITION | ARGUMENT_DEFINITION | SCALAR

directive @stringValue(
  minLength: Int
  maxLength: Int
  startsWith: String
  endsWith: String
  includes: String
  oneOf: [String]
  equals: String
  regex: String
) on FIELD_DEFINITION | INPUT_FIELD_DEFINITION | ARGUMENT_DEFINITION | SCALAR

input _ListConstraints {
  maxItems: Int
  minItems: Int
  uniqueItems: Boolean
  innerList: _ListConstraints
}

directive @list(
  maxItems: Int
  minItems: Int
  uniqueItems: Boolean
  innerList: _ListConstraints
) on FIELD_DEFINITION | INPUT_FIELD_DEFINITION | ARGUMENT_DEFINITION
"#;

/// Appends the constraint vocabulary to user schema text.
pub fn append_constraints_sdl(sdl: &str) -> String {
    let mut out = String::with_capacity(sdl.len() + CONSTRAINTS_SDL.len() + 1);
    out.push_str(sdl.trim_end());
    out.push('\n');
    out.push_str(CONSTRAINTS_SDL);
    out
}

/// Schema sites a directive can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    FieldDefinition,
    InputFieldDefinition,
    ArgumentDefinition,
    Scalar,
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Scalar => "SCALAR",
        })
    }
}

/// Declared type of a directive argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Int,
    Float,
    String,
    Boolean,
    FloatList,
    StringList,
    /// The recursive `_ListConstraints` input shape.
    ListConstraints,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArgType::Int => "Int",
            ArgType::Float => "Float",
            ArgType::String => "String",
            ArgType::Boolean => "Boolean",
            ArgType::FloatList => "[Float]",
            ArgType::StringList => "[String]",
            ArgType::ListConstraints => "_ListConstraints",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: ConstraintName,
    pub ty: ArgType,
    pub default: Option<ArgValue>,
}

impl ArgumentDefinition {
    fn new(name: ConstraintName, ty: ArgType) -> Self {
        ArgumentDefinition {
            name,
            ty,
            default: None,
        }
    }
}

/// One constraint directive: its key, its arguments in evaluation order,
/// and where it may be applied.
#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub key: DirectiveKey,
    pub arguments: Vec<ArgumentDefinition>,
    pub locations: SmallVec<[DirectiveLocation; 4]>,
}

impl DirectiveDefinition {
    pub fn name(&self) -> &'static str {
        self.key.directive_name()
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.arguments.iter().find(|a| a.name.as_str() == name)
    }

    pub fn is_legal_on(&self, location: DirectiveLocation) -> bool {
        self.locations.contains(&location)
    }
}

/// The immutable allow-list of constraint directives.
#[derive(Debug, Clone)]
pub struct DirectiveCatalog {
    definitions: IndexMap<&'static str, DirectiveDefinition>,
}

impl DirectiveCatalog {
    /// The three standard constraint directives.
    pub fn standard() -> Result<Self, SchemaDirectiveError> {
        use ArgType as T;
        use ConstraintName as N;

        let value_sites: SmallVec<[DirectiveLocation; 4]> = smallvec![
            DirectiveLocation::FieldDefinition,
            DirectiveLocation::InputFieldDefinition,
            DirectiveLocation::ArgumentDefinition,
            DirectiveLocation::Scalar,
        ];

        let number = DirectiveDefinition {
            key: DirectiveKey::NumberValue,
            arguments: vec![
                ArgumentDefinition::new(N::Min, T::Float),
                ArgumentDefinition::new(N::Max, T::Float),
                ArgumentDefinition::new(N::ExclusiveMax, T::Float),
                ArgumentDefinition::new(N::ExclusiveMin, T::Float),
                ArgumentDefinition::new(N::OneOf, T::FloatList),
                ArgumentDefinition::new(N::Equals, T::Float),
                ArgumentDefinition::new(N::MultipleOf, T::Float),
            ],
            locations: value_sites.clone(),
        };

        let string = DirectiveDefinition {
            key: DirectiveKey::StringValue,
            arguments: vec![
                ArgumentDefinition::new(N::MinLength, T::Int),
                ArgumentDefinition::new(N::MaxLength, T::Int),
                ArgumentDefinition::new(N::StartsWith, T::String),
                ArgumentDefinition::new(N::EndsWith, T::String),
                ArgumentDefinition::new(N::Includes, T::String),
                ArgumentDefinition::new(N::OneOf, T::StringList),
                ArgumentDefinition::new(N::Equals, T::String),
                ArgumentDefinition::new(N::Regex, T::String),
            ],
            locations: value_sites,
        };

        let list = DirectiveDefinition {
            key: DirectiveKey::List,
            arguments: vec![
                ArgumentDefinition::new(N::MaxItems, T::Int),
                ArgumentDefinition::new(N::MinItems, T::Int),
                ArgumentDefinition::new(N::UniqueItems, T::Boolean),
                ArgumentDefinition::new(N::InnerList, T::ListConstraints),
            ],
            locations: smallvec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::InputFieldDefinition,
                DirectiveLocation::ArgumentDefinition,
            ],
        };

        Self::from_definitions(vec![number, string, list])
    }

    /// Builds a catalog, rejecting duplicate directives or argument names and
    /// defaults that would not pass their own range checks.
    pub fn from_definitions(
        definitions: Vec<DirectiveDefinition>,
    ) -> Result<Self, SchemaDirectiveError> {
        let mut map = IndexMap::with_capacity(definitions.len());
        for def in definitions {
            for (i, arg) in def.arguments.iter().enumerate() {
                if def.arguments[..i].iter().any(|a| a.name == arg.name) {
                    return Err(SchemaDirectiveError::InvalidCatalog {
                        reason: format!("@{} declares '{}' twice", def.name(), arg.name),
                    });
                }
            }
            if def.key == DirectiveKey::List && def.locations.contains(&DirectiveLocation::Scalar)
            {
                return Err(SchemaDirectiveError::InvalidCatalog {
                    reason: "@list cannot be legal on SCALAR".into(),
                });
            }

            // Defaults go through the same decoding and range checks as
            // applied arguments.
            let defaults: IndexMap<String, ArgValue> = def
                .arguments
                .iter()
                .filter_map(|a| a.default.clone().map(|d| (a.name.as_str().to_string(), d)))
                .collect();
            let coordinate = format!("@{}", def.name());
            decode_arguments(&def, &defaults, &coordinate)?;

            if map.insert(def.name(), def).is_some() {
                return Err(SchemaDirectiveError::InvalidCatalog {
                    reason: "directive defined twice".into(),
                });
            }
        }
        Ok(DirectiveCatalog { definitions: map })
    }

    /// Looks up a directive by name (without `@`). Unknown names are not
    /// errors; the caller skips them.
    pub fn resolve(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.definitions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_resolves_three_directives() {
        let catalog = DirectiveCatalog::standard().unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.resolve("numberValue").unwrap().key, DirectiveKey::NumberValue);
        assert_eq!(catalog.resolve("stringValue").unwrap().key, DirectiveKey::StringValue);
        assert_eq!(catalog.resolve("list").unwrap().key, DirectiveKey::List);
        assert!(catalog.resolve("deprecated").is_none());
    }

    #[test]
    fn list_is_not_legal_on_scalars() {
        let catalog = DirectiveCatalog::standard().unwrap();
        let list = catalog.resolve("list").unwrap();
        assert!(!list.is_legal_on(DirectiveLocation::Scalar));
        assert!(list.is_legal_on(DirectiveLocation::ArgumentDefinition));
        let number = catalog.resolve("numberValue").unwrap();
        assert!(number.is_legal_on(DirectiveLocation::Scalar));
    }

    #[test]
    fn argument_order_is_evaluation_order() {
        let catalog = DirectiveCatalog::standard().unwrap();
        let names: Vec<&str> = catalog
            .resolve("stringValue")
            .unwrap()
            .arguments
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["minLength", "maxLength", "startsWith", "endsWith", "includes", "oneOf", "equals", "regex"]
        );
    }

    #[test]
    fn out_of_range_default_is_fatal() {
        let mut def = DirectiveCatalog::standard()
            .unwrap()
            .resolve("stringValue")
            .unwrap()
            .clone();
        def.arguments[0].default = Some(ArgValue::Int(-1));

        let err = DirectiveCatalog::from_definitions(vec![def]).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"@stringValue: @stringValue(minLength:) can't be less than 0"
        );
    }

    #[test]
    fn duplicate_argument_is_fatal() {
        let mut def = DirectiveCatalog::standard()
            .unwrap()
            .resolve("list")
            .unwrap()
            .clone();
        def.arguments.push(ArgumentDefinition::new(ConstraintName::MinItems, ArgType::Int));
        let err = DirectiveCatalog::from_definitions(vec![def]).unwrap_err();
        assert!(matches!(err, SchemaDirectiveError::InvalidCatalog { .. }));
    }

    #[test]
    fn sdl_is_appended_after_user_text() {
        let sdl = append_constraints_sdl("type Query { a: Int }\n\n");
        assert!(sdl.starts_with("type Query { a: Int }\n"));
        assert!(sdl.contains("directive @list("));
        assert!(sdl.contains("input _ListConstraints"));
    }
}
