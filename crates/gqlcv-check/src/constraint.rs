//! Constraint data: the decoded form of directive applications.
//!
//! A [`ConstraintSet`] is one decoded directive application. A
//! [`ConstraintMap`] groups sets by [`DirectiveKey`]; every set under every
//! key must hold (conjunction). Maps for input objects mirror the value
//! shape through `properties`, and reference the intrinsic maps of named
//! types through `inherits` instead of copying them, which keeps cyclic
//! input types finite.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

use gqlcv_core::{TypeId, ValueKind};

/// Identifies which directive a constraint set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DirectiveKey {
    #[serde(rename = "@numberValue")]
    NumberValue,
    #[serde(rename = "@stringValue")]
    StringValue,
    #[serde(rename = "@list")]
    List,
}

impl DirectiveKey {
    pub fn from_directive_name(name: &str) -> Option<Self> {
        match name {
            "numberValue" => Some(DirectiveKey::NumberValue),
            "stringValue" => Some(DirectiveKey::StringValue),
            "list" => Some(DirectiveKey::List),
            _ => None,
        }
    }

    /// Name as written in schema text, without the `@`.
    pub fn directive_name(self) -> &'static str {
        match self {
            DirectiveKey::NumberValue => "numberValue",
            DirectiveKey::StringValue => "stringValue",
            DirectiveKey::List => "list",
        }
    }

    /// The key a scalar value of `kind` is checked against.
    ///
    /// `None` for kinds without a value directive (booleans, and the
    /// non-scalar kinds).
    pub fn for_scalar_kind(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Number => Some(DirectiveKey::NumberValue),
            ValueKind::String => Some(DirectiveKey::StringValue),
            _ => None,
        }
    }

    /// The value kind this key constrains: the directive name with its
    /// `Value` suffix stripped.
    pub fn expected_kind(self) -> &'static str {
        let name = self.directive_name();
        name.strip_suffix("Value").unwrap_or(name)
    }
}

impl fmt::Display for DirectiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.directive_name())
    }
}

/// Every constraint name the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintName {
    Min,
    Max,
    ExclusiveMax,
    ExclusiveMin,
    OneOf,
    Equals,
    MultipleOf,
    MinLength,
    MaxLength,
    StartsWith,
    EndsWith,
    Includes,
    Regex,
    MaxItems,
    MinItems,
    UniqueItems,
    InnerList,
}

impl ConstraintName {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintName::Min => "min",
            ConstraintName::Max => "max",
            ConstraintName::ExclusiveMax => "exclusiveMax",
            ConstraintName::ExclusiveMin => "exclusiveMin",
            ConstraintName::OneOf => "oneOf",
            ConstraintName::Equals => "equals",
            ConstraintName::MultipleOf => "multipleOf",
            ConstraintName::MinLength => "minLength",
            ConstraintName::MaxLength => "maxLength",
            ConstraintName::StartsWith => "startsWith",
            ConstraintName::EndsWith => "endsWith",
            ConstraintName::Includes => "includes",
            ConstraintName::Regex => "regex",
            ConstraintName::MaxItems => "maxItems",
            ConstraintName::MinItems => "minItems",
            ConstraintName::UniqueItems => "uniqueItems",
            ConstraintName::InnerList => "innerList",
        }
    }
}

impl fmt::Display for ConstraintName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regex compiled once, when the schema is compiled.
#[derive(Debug, Clone)]
pub struct Pattern(regex::Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(source).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unanchored search, like `RegExp.test`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A declared constraint value, already coerced to its argument type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    FloatList(Vec<f64>),
    StringList(Vec<String>),
    Pattern(Pattern),
    /// `innerList`: the constraints of the next list level down.
    Nested(Box<ConstraintSet>),
}

impl ConstraintValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConstraintValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstraintValue::Int(i) => Some(*i as f64),
            ConstraintValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::Int(i) => write!(f, "{i}"),
            ConstraintValue::Float(x) => write!(f, "{x}"),
            ConstraintValue::String(s) => write!(f, "{s:?}"),
            ConstraintValue::Boolean(b) => write!(f, "{b}"),
            ConstraintValue::FloatList(items) => write_list(f, items.iter()),
            ConstraintValue::StringList(items) => {
                write_list(f, items.iter().map(|s| format!("{s:?}")))
            }
            ConstraintValue::Pattern(p) => write!(f, "/{}/", p.as_str()),
            ConstraintValue::Nested(set) => write!(f, "{set}"),
        }
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

/// One decoded directive application: constraint names with their declared
/// values, in the catalog's argument order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    entries: SmallVec<[(ConstraintName, ConstraintValue); 4]>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: ConstraintName, value: ConstraintValue) {
        self.entries.push((name, value));
    }

    pub fn with(mut self, name: ConstraintName, value: ConstraintValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: ConstraintName) -> Option<&ConstraintValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstraintName, &ConstraintValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `innerList` constraints, if this is a list set that has them.
    pub fn inner_list(&self) -> Option<&ConstraintSet> {
        match self.get(ConstraintName::InnerList) {
            Some(ConstraintValue::Nested(inner)) => Some(inner),
            _ => None,
        }
    }

    /// Length of the `innerList` chain, counting this set.
    pub fn list_depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self;
        while let Some(inner) = current.inner_list() {
            depth += 1;
            current = inner;
        }
        depth
    }
}

impl Serialize for ConstraintSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// Sequence of sets registered under one directive key. Almost always a
/// single set.
pub type ConstraintSets = SmallVec<[ConstraintSet; 1]>;

/// Compiled constraints for one value position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstraintMap {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    directives: IndexMap<DirectiveKey, ConstraintSets>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<String, ConstraintMap>,
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    inherits: SmallVec<[TypeId; 1]>,
}

impl ConstraintMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding one directive application.
    pub fn singleton(key: DirectiveKey, set: ConstraintSet) -> Self {
        let mut map = Self::new();
        map.insert(key, set);
        map
    }

    /// Registers `set` under `key`. An empty set registers the key without
    /// adding a set, so the key's presence still demands a matching value
    /// kind.
    pub fn insert(&mut self, key: DirectiveKey, set: ConstraintSet) {
        let sets = self.directives.entry(key).or_default();
        if !set.is_empty() {
            sets.push(set);
        }
    }

    /// Adds (or merges into) the constraints of an input object property.
    pub fn add_property(&mut self, name: impl Into<String>, map: ConstraintMap) {
        match self.properties.entry(name.into()) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().merge_from(map),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(map);
            }
        }
    }

    /// Makes the intrinsic map of `ty` part of this map.
    pub fn inherit(&mut self, ty: TypeId) {
        self.inherits.push(ty);
    }

    /// Concatenates `other` into `self`: directive sequences append, the
    /// maps of shared properties merge recursively, and inherited types
    /// append. Nothing from either side is dropped.
    pub fn merge_from(&mut self, other: ConstraintMap) {
        for (key, sets) in other.directives {
            self.directives.entry(key).or_default().extend(sets);
        }
        for (name, map) in other.properties {
            self.add_property(name, map);
        }
        self.inherits.extend(other.inherits);
    }

    pub fn merge(mut self, other: ConstraintMap) -> ConstraintMap {
        self.merge_from(other);
        self
    }

    pub fn directives(&self) -> impl Iterator<Item = (DirectiveKey, &[ConstraintSet])> {
        self.directives.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn has_directive(&self, key: DirectiveKey) -> bool {
        self.directives.contains_key(&key)
    }

    /// Sets under `key`, empty when the key is absent.
    pub fn sets(&self, key: DirectiveKey) -> &[ConstraintSet] {
        self.directives
            .get(&key)
            .map(|sets| sets.as_slice())
            .unwrap_or(&[])
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &ConstraintMap)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn property(&self, name: &str) -> Option<&ConstraintMap> {
        self.properties.get(name)
    }

    pub fn inherits(&self) -> &[TypeId] {
        &self.inherits
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.properties.is_empty() && self.inherits.is_empty()
    }

    /// Drops inherited references for which `is_empty_type` holds, and then
    /// any property left with nothing in it.
    pub(crate) fn prune(&mut self, is_empty_type: &impl Fn(TypeId) -> bool) {
        self.inherits.retain(|ty| !is_empty_type(*ty));
        for map in self.properties.values_mut() {
            map.prune(is_empty_type);
        }
        self.properties.retain(|_, map| !map.is_empty());
    }
}
