//! The constraint predicate table.
//!
//! [`check_declared`] range-checks a declared value once, when a directive
//! is decoded. [`holds`] evaluates one declared constraint against one
//! supplied value at request time. A constraint that does not apply to the
//! value's kind holds trivially; kind dispatch happens in the validator.

use gqlcv_core::Value;

use crate::constraint::{ConstraintName, ConstraintValue};

/// Integers up to 2^53 convert to `f64` exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Compile-time range check for a declared constraint value.
///
/// Returns the reason on failure.
pub fn check_declared(name: ConstraintName, declared: &ConstraintValue) -> Result<(), String> {
    use ConstraintName as N;

    match (name, declared) {
        (N::MinLength | N::MaxLength | N::MinItems | N::MaxItems, ConstraintValue::Int(n))
            if *n < 0 =>
        {
            Err("can't be less than 0".into())
        }
        (N::MultipleOf, value) => match value.as_f64() {
            Some(m) if m == 0.0 => Err("can't be 0".into()),
            Some(m) if !m.is_finite() => Err("must be finite".into()),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Whether `value` satisfies the constraint `name` declared as `declared`.
pub fn holds(name: ConstraintName, declared: &ConstraintValue, value: &Value) -> bool {
    use ConstraintName as N;
    use ConstraintValue as C;

    match value {
        Value::String(s) => match (name, declared) {
            (N::MinLength, C::Int(n)) => char_len(s) >= *n,
            (N::MaxLength, C::Int(n)) => char_len(s) <= *n,
            (N::StartsWith, C::String(prefix)) => s.starts_with(prefix.as_str()),
            (N::EndsWith, C::String(suffix)) => s.ends_with(suffix.as_str()),
            (N::Includes, C::String(needle)) => s.contains(needle.as_str()),
            (N::OneOf, C::StringList(options)) => options.iter().any(|o| o == s),
            (N::Equals, C::String(expected)) => s == expected,
            (N::Regex, C::Pattern(pattern)) => pattern.is_match(s),
            _ => true,
        },
        Value::Int(_) | Value::Float(_) => {
            let Some(x) = value.as_f64() else {
                return true;
            };
            match (name, declared) {
                (N::OneOf, C::FloatList(options)) => options.contains(&x),
                (N::MultipleOf, bound) => match bound.as_f64() {
                    Some(m) => is_multiple_of(value, m),
                    None => true,
                },
                (name, bound) => match bound.as_f64() {
                    Some(b) => match name {
                        N::Min => x >= b,
                        N::Max => x <= b,
                        N::ExclusiveMin => x > b,
                        N::ExclusiveMax => x < b,
                        N::Equals => x == b,
                        _ => true,
                    },
                    None => true,
                },
            }
        }
        Value::List(items) => match (name, declared) {
            (N::MinItems, C::Int(n)) => items.len() as i64 >= *n,
            (N::MaxItems, C::Int(n)) => items.len() as i64 <= *n,
            (N::UniqueItems, C::Boolean(true)) => first_duplicate(items).is_none(),
            _ => true,
        },
        Value::Null | Value::Boolean(_) | Value::Record(_) => true,
    }
}

/// Length in Unicode scalar values.
pub(crate) fn char_len(s: &str) -> i64 {
    s.chars().count() as i64
}

fn is_multiple_of(value: &Value, m: f64) -> bool {
    if m == 0.0 {
        return false;
    }
    if let Value::Int(i) = value {
        if m.fract() == 0.0 && m.abs() <= MAX_EXACT_INT {
            return i.wrapping_rem(m as i64) == 0;
        }
    }
    match value.as_f64() {
        Some(x) => (x / m).fract() == 0.0,
        None => true,
    }
}

/// Indexes of the first pair of equal items, if any.
pub(crate) fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (j, later) in items.iter().enumerate() {
        if let Some(i) = items[..j].iter().position(|earlier| earlier.same_as(later)) {
            return Some((i, j));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Pattern;
    use proptest::prelude::*;

    use ConstraintName as N;
    use ConstraintValue as C;

    #[test]
    fn negative_lengths_rejected_at_declaration() {
        assert!(check_declared(N::MinLength, &C::Int(-1)).is_err());
        assert!(check_declared(N::MaxItems, &C::Int(-3)).is_err());
        assert!(check_declared(N::MinLength, &C::Int(0)).is_ok());
        assert!(check_declared(N::Min, &C::Float(-10.0)).is_ok());
    }

    #[test]
    fn zero_multiple_rejected_at_declaration() {
        assert_eq!(
            check_declared(N::MultipleOf, &C::Float(0.0)),
            Err("can't be 0".to_string())
        );
    }

    #[test]
    fn string_predicates() {
        let s = Value::from("graphql");
        assert!(holds(N::StartsWith, &C::String("graph".into()), &s));
        assert!(!holds(N::EndsWith, &C::String("graph".into()), &s));
        assert!(holds(N::Includes, &C::String("aph".into()), &s));
        assert!(holds(N::OneOf, &C::StringList(vec!["rest".into(), "graphql".into()]), &s));
        assert!(!holds(N::Equals, &C::String("GraphQL".into()), &s));
        assert!(holds(N::Regex, &C::Pattern(Pattern::new("^g.+l$").unwrap()), &s));
        assert!(!holds(N::Regex, &C::Pattern(Pattern::new("^\\d+$").unwrap()), &s));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let s = Value::from("héllo");
        assert!(holds(N::MaxLength, &C::Int(5), &s));
        assert!(!holds(N::MaxLength, &C::Int(4), &s));
    }

    #[test]
    fn numeric_bounds() {
        let five = Value::Int(5);
        assert!(holds(N::Min, &C::Float(5.0), &five));
        assert!(!holds(N::ExclusiveMin, &C::Float(5.0), &five));
        assert!(holds(N::Max, &C::Float(5.0), &five));
        assert!(!holds(N::ExclusiveMax, &C::Float(5.0), &five));
        assert!(holds(N::Equals, &C::Float(5.0), &Value::Float(5.0)));
        assert!(holds(N::OneOf, &C::FloatList(vec![1.0, 5.0]), &five));
        assert!(!holds(N::OneOf, &C::FloatList(vec![1.0, 2.0]), &five));
    }

    #[test]
    fn multiple_of_integers_and_floats() {
        assert!(!holds(N::MultipleOf, &C::Float(3.0), &Value::Int(10)));
        assert!(holds(N::MultipleOf, &C::Float(3.0), &Value::Int(9)));
        assert!(holds(N::MultipleOf, &C::Float(0.5), &Value::Float(2.5)));
        assert!(!holds(N::MultipleOf, &C::Float(0.5), &Value::Float(2.25)));
        assert!(holds(N::MultipleOf, &C::Float(-1.0), &Value::Int(i64::MIN)));
    }

    #[test]
    fn list_predicates() {
        let list = Value::from(vec![1, 2, 1]);
        assert!(holds(N::MinItems, &C::Int(3), &list));
        assert!(!holds(N::MaxItems, &C::Int(2), &list));
        assert!(!holds(N::UniqueItems, &C::Boolean(true), &list));
        assert!(holds(N::UniqueItems, &C::Boolean(false), &list));
        assert_eq!(first_duplicate(&[Value::Int(1), Value::Int(2), Value::Int(1)]), Some((0, 2)));
    }

    #[test]
    fn inapplicable_constraints_hold() {
        assert!(holds(N::MinLength, &C::Int(10), &Value::Int(1)));
        assert!(holds(N::Min, &C::Float(10.0), &Value::from("x")));
        assert!(holds(N::MinItems, &C::Int(3), &Value::Null));
    }

    proptest! {
        #[test]
        fn min_length_rejects_iff_shorter(s in ".{0,24}", l in 0i64..24) {
            let passes = holds(N::MinLength, &C::Int(l), &Value::from(s.as_str()));
            prop_assert_eq!(passes, char_len(&s) >= l);
        }

        #[test]
        fn max_length_rejects_iff_longer(s in ".{0,24}", l in 0i64..24) {
            let passes = holds(N::MaxLength, &C::Int(l), &Value::from(s.as_str()));
            prop_assert_eq!(passes, char_len(&s) <= l);
        }
    }
}
