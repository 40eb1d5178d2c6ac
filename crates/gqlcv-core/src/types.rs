//! The schema type model.
//!
//! Provides the named types a schema is made of: scalars (built-in or
//! custom), input objects, output objects, and enums, plus the [`TypeRef`]
//! wrappers (list, non-null) that decorate a named type at every use site.
//!
//! All named types use nominal identity via [`TypeId`]. Fields and
//! arguments use [`IndexMap`] so declaration order is preserved; the map
//! key is the field or argument name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::directive::DirectiveNode;
use crate::type_id::TypeId;

/// A named type in the schema together with the directives applied to its
/// definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedType {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub directives: Vec<DirectiveNode>,
}

impl NamedType {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        NamedType {
            name: name.into(),
            kind,
            directives: Vec::new(),
        }
    }

    /// Attaches a directive application to the type definition.
    pub fn directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    /// Introspection types (`__Type`, `__Schema`, ...) never carry constraints.
    pub fn is_introspection(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// The schema type system. Each variant represents a distinct kind of
/// named type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeKind {
    Scalar(ScalarDef),

    /// Record-shaped input type with ordered fields.
    InputObject(InputObjectDef),

    /// Output object type. Its fields carry the arguments that get validated.
    Object(ObjectDef),

    Enum(EnumDef),

    /// Reserved by [`SchemaGraph::declare`](crate::SchemaGraph::declare) and
    /// not yet defined.
    Placeholder,
}

/// The five scalars every schema starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinScalar {
    Int,
    Float,
    String,
    Boolean,
    Id,
}

impl BuiltinScalar {
    pub const ALL: [BuiltinScalar; 5] = [
        BuiltinScalar::Int,
        BuiltinScalar::Float,
        BuiltinScalar::String,
        BuiltinScalar::Boolean,
        BuiltinScalar::Id,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinScalar::Int => "Int",
            BuiltinScalar::Float => "Float",
            BuiltinScalar::String => "String",
            BuiltinScalar::Boolean => "Boolean",
            BuiltinScalar::Id => "ID",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BuiltinScalar::Int | BuiltinScalar::Float)
    }

    pub fn is_string(self) -> bool {
        matches!(self, BuiltinScalar::String | BuiltinScalar::Id)
    }
}

/// Scalar definition. `builtin` is `None` for custom scalars.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalarDef {
    #[serde(default)]
    pub builtin: Option<BuiltinScalar>,
}

impl ScalarDef {
    pub fn custom() -> Self {
        ScalarDef { builtin: None }
    }
}

/// Input object definition with insertion-ordered fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputObjectDef {
    pub fields: IndexMap<String, InputValueDef>,
}

impl InputObjectDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. A field with the same name is replaced.
    pub fn field(mut self, name: impl Into<String>, def: InputValueDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }
}

/// Output object definition with insertion-ordered fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectDef {
    pub fields: IndexMap<String, FieldDef>,
}

impl ObjectDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. A field with the same name is replaced.
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumDef {
    pub values: Vec<String>,
}

/// A typed input slot: either a field argument or an input object field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputValueDef {
    pub ty: TypeRef,
    #[serde(default)]
    pub directives: Vec<DirectiveNode>,
}

impl InputValueDef {
    pub fn new(ty: TypeRef) -> Self {
        InputValueDef {
            ty,
            directives: Vec::new(),
        }
    }

    pub fn directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }
}

/// A field of an output object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub ty: TypeRef,
    #[serde(default)]
    pub arguments: IndexMap<String, InputValueDef>,
    #[serde(default)]
    pub directives: Vec<DirectiveNode>,
}

impl FieldDef {
    pub fn new(ty: TypeRef) -> Self {
        FieldDef {
            ty,
            arguments: IndexMap::new(),
            directives: Vec::new(),
        }
    }

    /// Adds an argument. An argument with the same name is replaced.
    pub fn argument(mut self, name: impl Into<String>, def: InputValueDef) -> Self {
        self.arguments.insert(name.into(), def);
        self
    }

    pub fn directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }
}

/// A reference to a named type, possibly wrapped in list and non-null
/// modifiers, e.g. `[[Int!]]!`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(TypeId),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(id: TypeId) -> Self {
        TypeRef::Named(id)
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    /// The named type at the core of every wrapper.
    pub fn named_type(&self) -> TypeId {
        let mut current = self;
        loop {
            match current {
                TypeRef::Named(id) => return *id,
                TypeRef::List(inner) | TypeRef::NonNull(inner) => current = inner,
            }
        }
    }

    /// Number of list wrappers. Non-null wrappers do not count.
    pub fn list_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        loop {
            match current {
                TypeRef::Named(_) => return depth,
                TypeRef::List(inner) => {
                    depth += 1;
                    current = inner;
                }
                TypeRef::NonNull(inner) => current = inner,
            }
        }
    }
}
