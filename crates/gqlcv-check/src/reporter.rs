//! Diagnostic messages for failed constraints.

use gqlcv_core::Value;

use crate::constraint::{ConstraintName, ConstraintValue};
use crate::predicate::{char_len, first_duplicate};

/// Describes why `value` fails `name` declared as `declared`.
pub fn describe(name: ConstraintName, declared: &ConstraintValue, value: &Value) -> String {
    use ConstraintName as N;

    match name {
        N::MinLength => format!(
            "{value} has length {}, less than minLength {declared}",
            length(value)
        ),
        N::MaxLength => format!(
            "{value} has length {}, greater than maxLength {declared}",
            length(value)
        ),
        N::StartsWith => format!("{value} doesn't start with {declared}"),
        N::EndsWith => format!("{value} doesn't end with {declared}"),
        N::Includes => format!("{value} doesn't include {declared}"),
        N::OneOf => format!("{value} is not one of {declared}"),
        N::Equals => format!("{value} is not equal to {declared}"),
        N::Regex => format!("{value} does not match pattern {declared}"),
        N::Min => format!("{value} is less than min {declared}"),
        N::Max => format!("{value} is greater than max {declared}"),
        N::ExclusiveMin => format!("{value} is less than or equal to exclusiveMin {declared}"),
        N::ExclusiveMax => {
            format!("{value} is greater than or equal to exclusiveMax {declared}")
        }
        N::MultipleOf => format!("{value} is not a multiple of {declared}"),
        N::MinItems => format!("list has {} items, fewer than minItems {declared}", items(value)),
        N::MaxItems => format!("list has {} items, more than maxItems {declared}", items(value)),
        N::UniqueItems => match value {
            Value::List(list) => match first_duplicate(list) {
                Some((i, j)) => format!("items at index {i} and {j} are equal, violating uniqueItems"),
                None => "list violates uniqueItems".to_string(),
            },
            _ => "value violates uniqueItems".to_string(),
        },
        N::InnerList => format!("{value} violates innerList {declared}"),
    }
}

fn length(value: &Value) -> i64 {
    value.as_str().map(char_len).unwrap_or(0)
}

fn items(value: &Value) -> usize {
    match value {
        Value::List(list) => list.len(),
        _ => 0,
    }
}
