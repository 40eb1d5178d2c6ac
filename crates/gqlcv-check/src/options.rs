//! Options controlling constraint compilation.

use serde::{Deserialize, Serialize};

use gqlcv_core::ScalarDef;

use crate::constraint::DirectiveKey;

/// Which scalars accept which value directives.
///
/// Built-in `Int`/`Float` always accept `@numberValue` and `String`/`ID`
/// always accept `@stringValue`. Custom scalars accept both unless
/// `allow_unlisted_custom_scalars` is turned off, in which case only the
/// scalars named in `numeric_scalars` / `string_scalars` do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Custom scalars explicitly accepting `@numberValue`.
    pub numeric_scalars: Vec<String>,

    /// Custom scalars explicitly accepting `@stringValue`.
    pub string_scalars: Vec<String>,

    pub allow_unlisted_custom_scalars: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            numeric_scalars: Vec::new(),
            string_scalars: Vec::new(),
            allow_unlisted_custom_scalars: true,
        }
    }
}

impl CompileOptions {
    /// Reads options from a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether a scalar named `name` may carry the value directive `key`.
    pub fn scalar_accepts(&self, name: &str, scalar: &ScalarDef, key: DirectiveKey) -> bool {
        match (scalar.builtin, key) {
            (_, DirectiveKey::List) => false,
            (Some(builtin), DirectiveKey::NumberValue) => builtin.is_numeric(),
            (Some(builtin), DirectiveKey::StringValue) => builtin.is_string(),
            (None, DirectiveKey::NumberValue) => {
                self.allow_unlisted_custom_scalars || self.numeric_scalars.iter().any(|s| s == name)
            }
            (None, DirectiveKey::StringValue) => {
                self.allow_unlisted_custom_scalars || self.string_scalars.iter().any(|s| s == name)
            }
        }
    }
}

/// Human-readable family name used in applicability errors.
pub(crate) fn family(key: DirectiveKey) -> &'static str {
    match key {
        DirectiveKey::NumberValue => "numeric",
        DirectiveKey::StringValue => "string",
        DirectiveKey::List => "list",
    }
}
