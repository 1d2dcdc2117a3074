//! Ordering types for sorting query results.
//!
//! Provides [`Dir`] for sort direction and [`OrderBy`] for path-based ordering.
//! Sorting is the one stage of a query that has to see every record before it
//! can yield the first one.

use std::cmp::Ordering;

use crate::path::KeyPath;
use crate::value::{Record, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ordering clause: a path and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The path to sort by.
    pub path: KeyPath,
    /// The sort direction.
    pub dir: Dir,
}

impl OrderBy {
    /// Creates a new ascending ordering for the given path.
    pub fn asc(path: impl Into<KeyPath>) -> Self {
        OrderBy::new(path, Dir::Asc)
    }

    /// Creates a new descending ordering for the given path.
    pub fn desc(path: impl Into<KeyPath>) -> Self {
        OrderBy::new(path, Dir::Desc)
    }

    /// Creates a new ordering with the given direction.
    pub fn new(path: impl Into<KeyPath>, dir: Dir) -> Self {
        OrderBy {
            path: path.into(),
            dir,
        }
    }

    /// Compares two records by this clause.
    ///
    /// Absent and null values sort last in either direction.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let a = self.path.resolve(a).filter(|v| !v.is_null());
        let b = self.path.resolve(b).filter(|v| !v.is_null());
        match (a, b) {
            (Some(a), Some(b)) => self.dir.apply(compare_values(a, b)),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        }
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Text(_) => 3,
        Value::List(_) => 4,
        Value::Map(_) => 5,
    }
}

/// Total order over values, used for sorting.
///
/// Values of the same kind compare naturally (lists lexicographically, maps
/// all equal). Different kinds are ordered
/// null < bool < number < text < list < map, so mixed collections still sort
/// deterministically.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .compare(*b)
            .unwrap_or_else(|| a.to_f64().total_cmp(&b.to_f64())),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => a
            .iter()
            .zip(b)
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (a, b) => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Compares two records using a list of ordering clauses.
///
/// Uses the first clause as the primary sort key, the second to break ties,
/// etc. If all clauses compare equal, returns `Equal`.
pub fn compare_by_orderings(a: &Record, b: &Record, orderings: &[OrderBy]) -> Ordering {
    orderings
        .iter()
        .map(|order_by| order_by.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{record_from_json, Number};
    use serde_json::json;

    fn record(json: serde_json::Value) -> Record {
        record_from_json(json).unwrap()
    }

    #[test]
    fn dir_apply() {
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn dir_display() {
        assert_eq!(Dir::Asc.to_string(), "asc");
        assert_eq!(Dir::Desc.to_string(), "desc");
    }

    #[test]
    fn order_by_constructors() {
        let asc = OrderBy::asc("response__status");
        assert_eq!(asc.path.segments(), ["response", "status"]);
        assert_eq!(asc.dir, Dir::Asc);
        assert_eq!(OrderBy::desc("x").dir, Dir::Desc);
    }

    #[test]
    fn compare_same_kinds() {
        assert_eq!(compare_values(&Value::from("a"), &Value::from("b")), Ordering::Less);
        assert_eq!(compare_values(&Value::from(10), &Value::from(2.5)), Ordering::Greater);
        assert_eq!(compare_values(&Value::from(false), &Value::from(true)), Ordering::Less);
        assert_eq!(
            compare_values(&Value::from(vec![1, 2]), &Value::from(vec![1, 2, 0])),
            Ordering::Less
        );
    }

    #[test]
    fn compare_mixed_kinds_is_total() {
        assert_eq!(compare_values(&Value::from(1), &Value::from("1")), Ordering::Less);
        assert_eq!(compare_values(&Value::from("1"), &Value::from(true)), Ordering::Greater);
        let nan = Value::Number(Number::F64(f64::NAN));
        assert_eq!(compare_values(&nan, &nan), Ordering::Equal);
    }

    #[test]
    fn absent_and_null_sort_last_both_ways() {
        let present = record(json!({"p": 1}));
        let null = record(json!({"p": null}));
        let absent = record(json!({}));
        for order_by in [OrderBy::asc("p"), OrderBy::desc("p")] {
            assert_eq!(order_by.compare(&present, &absent), Ordering::Less);
            assert_eq!(order_by.compare(&null, &present), Ordering::Greater);
            assert_eq!(order_by.compare(&null, &absent), Ordering::Equal);
        }
    }

    #[test]
    fn compare_by_multiple_orderings() {
        let items = [
            record(json!({"name": "a", "priority": 1})),
            record(json!({"name": "b", "priority": 1})),
            record(json!({"name": "a", "priority": 2})),
        ];
        let orderings = [OrderBy::asc("priority"), OrderBy::desc("name")];

        // Same priority, compare by name descending
        assert_eq!(
            compare_by_orderings(&items[0], &items[1], &orderings),
            Ordering::Greater
        );
        // Different priority
        assert_eq!(
            compare_by_orderings(&items[0], &items[2], &orderings),
            Ordering::Less
        );
        assert_eq!(compare_by_orderings(&items[0], &items[0], &orderings), Ordering::Equal);
    }
}
