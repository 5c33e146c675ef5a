//! Diff computation between observed records and desired settings
//!
//! The API is loose about scalar types: booleans come back as `0`/`1`,
//! numbers sometimes as strings, and unset flags are simply missing.
//! [`values_match`] absorbs those differences so a converged resource
//! never looks drifted.

use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hash;

/// Whether an observed field value satisfies a desired one
pub fn values_match(observed: Option<&Value>, desired: &Value) -> bool {
    let observed = observed.unwrap_or(&Value::Null);
    match (desired, observed) {
        (Value::Bool(want), Value::Bool(have)) => want == have,
        (Value::Bool(want), Value::Number(n)) => n.as_i64().is_some_and(|n| (n != 0) == *want),
        (Value::Bool(want), Value::String(s)) => match s.as_str() {
            "1" | "true" => *want,
            "0" | "false" | "" => !*want,
            _ => false,
        },
        (Value::Bool(want), Value::Null) => !*want,
        (Value::Number(want), Value::Number(have)) => want.as_f64() == have.as_f64(),
        (Value::Number(want), Value::String(s)) => {
            s.trim().parse::<f64>().ok() == want.as_f64()
        }
        (Value::String(want), Value::Number(n)) => want.trim().parse::<f64>().ok() == n.as_f64(),
        (want, have) => want == have,
    }
}

/// Names of the desired fields the observed record does not satisfy
pub fn drifted_fields<'a>(observed: &Value, expected: &'a [(&'static str, Value)]) -> Vec<&'a str> {
    expected
        .iter()
        .filter(|(field, want)| !values_match(observed.get(*field), want))
        .map(|(field, _)| *field)
        .collect()
}

/// Membership difference between a desired and an observed set
///
/// Both lists keep the order of their source and contain no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDiff<T> {
    /// Desired but not observed
    pub to_add: Vec<T>,
    /// Observed but not desired
    pub to_remove: Vec<T>,
}

impl<T: Eq + Hash + Clone> SetDiff<T> {
    /// Compare a desired set with an observed one
    pub fn compute(desired: &[T], observed: &[T]) -> Self {
        let desired_set: HashSet<&T> = desired.iter().collect();
        let observed_set: HashSet<&T> = observed.iter().collect();

        Self {
            to_add: unique(desired.iter().filter(|item| !observed_set.contains(item))),
            to_remove: unique(observed.iter().filter(|item| !desired_set.contains(item))),
        }
    }

    /// No membership change needed
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

fn unique<'a, T: Eq + Hash + Clone + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}
