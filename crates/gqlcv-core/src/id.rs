//! Identity of a schema field, used to key compiled argument constraints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Owner type name plus field name, e.g. `Query.books`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub owner: String,
    pub field: String,
}

impl FieldKey {
    pub fn new(owner: impl Into<String>, field: impl Into<String>) -> Self {
        FieldKey {
            owner: owner.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.field)
    }
}
