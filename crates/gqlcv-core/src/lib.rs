pub mod directive;
pub mod error;
pub mod id;
pub mod type_id;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use directive::{ArgValue, DirectiveNode};
pub use error::CoreError;
pub use id::FieldKey;
pub use type_id::{SchemaGraph, TypeId};
pub use types::{
    BuiltinScalar, EnumDef, FieldDef, InputObjectDef, InputValueDef, NamedType, ObjectDef,
    ScalarDef, TypeKind, TypeRef,
};
pub use value::{Value, ValueKind};
