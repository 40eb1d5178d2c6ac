//! TypeId and SchemaGraph for nominal typing.
//!
//! Every named type in a schema has a unique [`TypeId`] providing O(1)
//! identity comparison. The [`SchemaGraph`] is the arena that owns the
//! named types, pre-registering the five built-in scalars on construction.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::directive::DirectiveNode;
use crate::error::CoreError;
use crate::types::{BuiltinScalar, NamedType, ScalarDef, TypeKind};

/// Unique identifier for a named type in the schema graph.
///
/// The inner value is an index into the [`SchemaGraph`]'s type vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in scalars.
impl TypeId {
    pub const INT: TypeId = TypeId(0);
    pub const FLOAT: TypeId = TypeId(1);
    pub const STRING: TypeId = TypeId(2);
    pub const BOOLEAN: TypeId = TypeId(3);
    pub const ID: TypeId = TypeId(4);

    /// Index into arena vectors keyed by type identity.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The navigable type graph of one schema.
///
/// Types reference each other by [`TypeId`], so cycles between input
/// objects are representable without shared ownership. On construction the
/// graph holds the built-in scalars:
/// - `TypeId(0)` = Int
/// - `TypeId(1)` = Float
/// - `TypeId(2)` = String
/// - `TypeId(3)` = Boolean
/// - `TypeId(4)` = ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaGraph {
    /// Types indexed by TypeId.0
    types: Vec<NamedType>,
    /// Name lookup
    names: HashMap<String, TypeId>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        let mut graph = SchemaGraph {
            types: Vec::with_capacity(BuiltinScalar::ALL.len()),
            names: HashMap::new(),
        };
        for scalar in BuiltinScalar::ALL {
            graph.push(NamedType::new(
                scalar.name(),
                TypeKind::Scalar(ScalarDef {
                    builtin: Some(scalar),
                }),
            ));
        }
        graph
    }

    fn push(&mut self, ty: NamedType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.names.insert(ty.name.clone(), id);
        self.types.push(ty);
        id
    }

    /// Registers a fully defined named type and returns its [`TypeId`].
    ///
    /// Returns [`CoreError::DuplicateTypeName`] if the name is taken.
    pub fn register_named(&mut self, ty: NamedType) -> Result<TypeId, CoreError> {
        if self.names.contains_key(&ty.name) {
            return Err(CoreError::DuplicateTypeName { name: ty.name });
        }
        Ok(self.push(ty))
    }

    /// Reserves a [`TypeId`] for a type that will be defined later.
    ///
    /// Needed for input objects that refer to each other (or to themselves).
    pub fn declare(&mut self, name: &str) -> Result<TypeId, CoreError> {
        self.register_named(NamedType::new(name, TypeKind::Placeholder))
    }

    /// Fills in a type previously reserved with [`declare`](Self::declare).
    pub fn define(
        &mut self,
        id: TypeId,
        kind: TypeKind,
        directives: Vec<DirectiveNode>,
    ) -> Result<(), CoreError> {
        let ty = self
            .types
            .get_mut(id.index())
            .ok_or(CoreError::TypeNotFound { id })?;
        if !matches!(ty.kind, TypeKind::Placeholder) {
            return Err(CoreError::AlreadyDefined {
                name: ty.name.clone(),
            });
        }
        ty.kind = kind;
        ty.directives = directives;
        Ok(())
    }

    /// Convenience for registering a custom scalar.
    pub fn register_scalar(
        &mut self,
        name: &str,
        directives: Vec<DirectiveNode>,
    ) -> Result<TypeId, CoreError> {
        let mut ty = NamedType::new(name, TypeKind::Scalar(ScalarDef::custom()));
        ty.directives = directives;
        self.register_named(ty)
    }

    /// Looks up a type by its [`TypeId`].
    pub fn get(&self, id: TypeId) -> Option<&NamedType> {
        self.types.get(id.index())
    }

    /// Looks up a named type's [`TypeId`] by name.
    pub fn get_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Returns the pre-registered [`TypeId`] for a built-in scalar.
    pub fn builtin_type_id(&self, scalar: BuiltinScalar) -> TypeId {
        match scalar {
            BuiltinScalar::Int => TypeId::INT,
            BuiltinScalar::Float => TypeId::FLOAT,
            BuiltinScalar::String => TypeId::STRING,
            BuiltinScalar::Boolean => TypeId::BOOLEAN,
            BuiltinScalar::Id => TypeId::ID,
        }
    }

    /// Iterates over every type in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &NamedType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (TypeId(i as u32), ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Fails on the first type that was declared but never defined.
    pub fn ensure_defined(&self) -> Result<(), CoreError> {
        match self
            .types
            .iter()
            .find(|ty| matches!(ty.kind, TypeKind::Placeholder))
        {
            Some(ty) => Err(CoreError::UndefinedType {
                name: ty.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}
