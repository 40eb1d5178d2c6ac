//! Request-time validation of argument values.
//!
//! Dispatches on the runtime [`ValueKind`] of the supplied value, never on
//! the declared type. The compiled maps that apply at a position are
//! gathered into a borrowed [`View`] (the map itself plus every map it
//! inherits from the index), so validation allocates nothing but the view
//! and the diagnostic on failure.

use indexmap::IndexMap;
use smallvec::SmallVec;

use gqlcv_core::{FieldKey, TypeId, Value, ValueKind};

use crate::compile::CompiledIndex;
use crate::constraint::{ConstraintMap, ConstraintName, ConstraintSet, ConstraintValue, DirectiveKey};
use crate::diagnostics::{PathSegment, ValidationError, ValuePath};
use crate::predicate::holds;
use crate::reporter::describe;

/// Validates every constrained argument of `field`.
///
/// Arguments are checked in declaration order and the first violation is
/// returned. Absent arguments and fields without constraints pass.
pub fn validate_arguments(
    index: &CompiledIndex,
    field: &FieldKey,
    arguments: &IndexMap<String, Value>,
) -> Result<(), ValidationError> {
    let Some(constrained) = index.field_arguments(field) else {
        return Ok(());
    };
    tracing::trace!(field = %field, supplied = arguments.len(), "validating arguments");

    for (name, map) in constrained {
        let Some(value) = arguments.get(name) else {
            continue;
        };
        let mut path = ValuePath::argument(name);
        check(index, &View::new(index, [map]), value, &mut path)?;
    }
    Ok(())
}

/// Validates one value against a compiled map.
pub fn validate(index: &CompiledIndex, value: &Value, map: &ConstraintMap) -> Result<(), ValidationError> {
    let mut path = ValuePath::root();
    check(index, &View::new(index, [map]), value, &mut path)
}

/// The conjunction of maps that apply at one value position.
struct View<'a> {
    maps: SmallVec<[&'a ConstraintMap; 4]>,
    /// List-level sets for a list element, derived from the parent's
    /// `innerList`. Replaces the maps' own `@list` sets when present.
    lists: Option<SmallVec<[&'a ConstraintSet; 2]>>,
}

impl<'a> View<'a> {
    fn new(index: &'a CompiledIndex, roots: impl IntoIterator<Item = &'a ConstraintMap>) -> Self {
        let mut maps = SmallVec::new();
        let mut seen = SmallVec::<[TypeId; 4]>::new();
        for root in roots {
            collect(index, root, &mut maps, &mut seen);
        }
        View { maps, lists: None }
    }

    fn list_sets(&self) -> SmallVec<[&'a ConstraintSet; 2]> {
        match &self.lists {
            Some(sets) => sets.clone(),
            None => self
                .maps
                .iter()
                .copied()
                .flat_map(|map| map.sets(DirectiveKey::List))
                .collect(),
        }
    }

    fn has_list_key(&self) -> bool {
        match &self.lists {
            Some(sets) => !sets.is_empty(),
            None => self.maps.iter().any(|map| map.has_directive(DirectiveKey::List)),
        }
    }

    /// Directive keys present at this position, in declaration order.
    fn keys(&self) -> SmallVec<[DirectiveKey; 3]> {
        let mut keys = SmallVec::<[DirectiveKey; 3]>::new();
        for map in &self.maps {
            for (key, _) in map.directives() {
                if key != DirectiveKey::List && !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        if self.has_list_key() {
            keys.push(DirectiveKey::List);
        }
        keys
    }
}

fn collect<'a>(
    index: &'a CompiledIndex,
    map: &'a ConstraintMap,
    maps: &mut SmallVec<[&'a ConstraintMap; 4]>,
    seen: &mut SmallVec<[TypeId; 4]>,
) {
    maps.push(map);
    for &ty in map.inherits() {
        if seen.contains(&ty) {
            continue;
        }
        seen.push(ty);
        if let Some(inherited) = index.type_constraints(ty) {
            collect(index, inherited, maps, seen);
        }
    }
}

fn check(
    index: &CompiledIndex,
    view: &View<'_>,
    value: &Value,
    path: &mut ValuePath,
) -> Result<(), ValidationError> {
    match value {
        Value::Null => Ok(()),
        Value::List(items) => {
            let sets = view.list_sets();
            for set in &sets {
                for (name, declared) in set.iter() {
                    if name == ConstraintName::InnerList {
                        continue;
                    }
                    if !holds(name, declared, value) {
                        return Err(violation(path, DirectiveKey::List, name, declared, value));
                    }
                }
            }

            let element = View {
                maps: view.maps.clone(),
                lists: Some(sets.iter().filter_map(|&set| set.inner_list()).collect()),
            };
            for (i, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(i));
                check(index, &element, item, path)?;
                path.pop();
            }
            Ok(())
        }
        Value::Record(record) => {
            let mut names = SmallVec::<[&str; 8]>::new();
            for map in &view.maps {
                for (name, _) in map.properties() {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
            for name in names {
                let Some(field) = record.get(name) else {
                    continue;
                };
                let property = View::new(index, view.maps.iter().filter_map(|map| map.property(name)));
                path.push(PathSegment::Key(name.to_string()));
                check(index, &property, field, path)?;
                path.pop();
            }
            Ok(())
        }
        Value::Boolean(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {
            check_scalar(view, value, path)
        }
    }
}

fn check_scalar(view: &View<'_>, value: &Value, path: &ValuePath) -> Result<(), ValidationError> {
    let keys = view.keys();
    if keys.is_empty() {
        return Ok(());
    }

    let kind = value.kind();
    let Some(key) = DirectiveKey::for_scalar_kind(kind).filter(|key| keys.contains(key)) else {
        return Err(kind_mismatch(path, kind, &keys));
    };
    for map in &view.maps {
        for set in map.sets(key) {
            for (name, declared) in set.iter() {
                if !holds(name, declared, value) {
                    return Err(violation(path, key, name, declared, value));
                }
            }
        }
    }
    Ok(())
}

fn kind_mismatch(path: &ValuePath, got: ValueKind, keys: &[DirectiveKey]) -> ValidationError {
    tracing::debug!(path = %path, got = %got, "argument kind matches no declared constraint");
    ValidationError::KindMismatch {
        path: path.clone(),
        got,
        expected: keys.iter().map(|key| key.expected_kind()).collect(),
    }
}

fn violation(
    path: &ValuePath,
    directive: DirectiveKey,
    constraint: ConstraintName,
    declared: &ConstraintValue,
    actual: &Value,
) -> ValidationError {
    tracing::debug!(path = %path, %directive, %constraint, "argument violates constraint");
    ValidationError::ConstraintViolation {
        path: path.clone(),
        directive,
        constraint,
        declared: declared.clone(),
        actual: actual.clone(),
        message: describe(constraint, declared, actual),
    }
}
