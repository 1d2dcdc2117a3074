//! Compound key paths addressing nested fields.
//!
//! A compound key such as `request__url` addresses the `url` field inside the
//! `request` map. The separator is the two-character token [`SEPARATOR`].
//!
//! Field names that themselves contain the separator cannot be expressed as a
//! compound key string. Build those paths with [`KeyPath::from_segments`];
//! their [`KeyPath::to_key`] rendering is ambiguous and will not parse back to
//! the same path.

use std::collections::HashMap;
use std::fmt;

use crate::error::{LookupError, Result};
use crate::value::{Record, Value};

/// Separator between the segments of a compound key.
pub const SEPARATOR: &str = "__";

/// An ordered sequence of field names addressing a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parses a compound key, splitting on every separator.
    ///
    /// Parsing is lenient: empty segments are kept literally and simply never
    /// resolve (unless a record really has a field named `""`).
    pub fn parse(key: &str) -> Self {
        KeyPath {
            segments: key.split(SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Parses a compound key, rejecting empty keys and empty segments.
    ///
    /// ```
    /// use standout_lookup::KeyPath;
    ///
    /// assert!(KeyPath::parse_strict("request__url").is_ok());
    /// assert!(KeyPath::parse_strict("request____url").is_err());
    /// ```
    pub fn parse_strict(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(LookupError::invalid_path(key, "empty key"));
        }
        let path = KeyPath::parse(key);
        if path.segments.iter().any(String::is_empty) {
            return Err(LookupError::invalid_path(key, "empty segment"));
        }
        Ok(path)
    }

    /// Builds a path from explicit segments, bypassing separator parsing.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the innermost field name.
    pub fn last_segment(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Renders the path as a compound key.
    pub fn to_key(&self) -> String {
        self.segments.join(SEPARATOR)
    }

    /// Resolves this path against a record.
    pub fn resolve<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        let (first, rest) = self.segments.split_first()?;
        rest.iter()
            .try_fold(record.get(first)?, |value, segment| value.get(segment))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}

impl From<&str> for KeyPath {
    fn from(key: &str) -> Self {
        KeyPath::parse(key)
    }
}

impl From<String> for KeyPath {
    fn from(key: String) -> Self {
        KeyPath::parse(&key)
    }
}

/// Resolves a compound key against a record.
///
/// Any missing key at any depth, or an attempt to descend into a non-map
/// value, yields `None` (the field is absent). This never fails.
///
/// ```
/// use standout_lookup::{resolve, record_from_json, Value};
///
/// let record = record_from_json(serde_json::json!({"a": {"b": 1}})).unwrap();
/// assert_eq!(resolve(&record, "a__b"), Some(&Value::from(1)));
/// assert_eq!(resolve(&record, "a__c"), None);
/// ```
pub fn resolve<'r>(record: &'r Record, key: &str) -> Option<&'r Value> {
    KeyPath::parse(key).resolve(record)
}

/// Returns the last segment of a compound key.
///
/// Segments are split left to right, as in [`KeyPath::parse`], so
/// `meta___id` ends in `_id`.
pub fn last_segment(key: &str) -> &str {
    key.split(SEPARATOR).last().unwrap_or(key)
}

/// Rebuilds a nested record from a flat record with compound keys.
///
/// Entries sharing a prefix are grouped into nested maps at every depth. When
/// two entries meet at the same key, maps are merged recursively; otherwise
/// the later entry replaces the earlier one.
///
/// ```
/// use standout_lookup::{nest, record_from_json};
///
/// let flat = record_from_json(serde_json::json!({"a": 1, "b__c": 2})).unwrap();
/// let nested = record_from_json(serde_json::json!({"a": 1, "b": {"c": 2}})).unwrap();
/// assert_eq!(nest(flat), nested);
/// ```
pub fn nest(flat: Record) -> Record {
    nest_entries(
        flat.into_iter()
            .map(|(key, value)| (KeyPath::parse(&key), value)),
    )
}

pub(crate) fn nest_entries<I>(entries: I) -> Record
where
    I: IntoIterator<Item = (KeyPath, Value)>,
{
    let mut nested = Record::new();
    for (path, value) in entries {
        insert_at(&mut nested, path.segments(), value);
    }
    nested
}

fn insert_at(target: &mut Record, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let incoming = if rest.is_empty() {
        value
    } else {
        let mut branch = Record::new();
        insert_at(&mut branch, rest, value);
        Value::Map(branch)
    };
    merge_into(target, first.clone(), incoming);
}

fn merge_into(target: &mut Record, key: String, incoming: Value) {
    match (target.get_mut(&key), incoming) {
        (Some(Value::Map(existing)), Value::Map(branch)) => {
            for (k, v) in branch {
                merge_into(existing, k, v);
            }
        }
        (_, incoming) => {
            target.insert(key, incoming);
        }
    }
}

/// Flattens a nested record into fully qualified compound keys.
///
/// Empty maps are kept as leaf values so that [`nest`] restores them.
pub fn flatten(nested: &Record) -> Record {
    let mut flat = Record::new();
    flatten_into(&mut flat, None, nested);
    flat
}

fn flatten_into(flat: &mut Record, prefix: Option<&str>, nested: &Record) {
    for (key, value) in nested {
        let qualified = match prefix {
            Some(prefix) => format!("{prefix}{SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Map(inner) if !inner.is_empty() => flatten_into(flat, Some(&qualified), inner),
            leaf => {
                flat.insert(qualified, leaf.clone());
            }
        }
    }
}

/// Flattens a nested record, shortening keys to their leaf name where that
/// name is unambiguous.
///
/// Leaves whose name occurs under two or more different prefixes keep their
/// fully qualified compound key; every other leaf is shortened.
///
/// ```
/// use standout_lookup::{unnest, record_from_json};
///
/// let nested = record_from_json(serde_json::json!({
///     "request": {"url": "x", "id": 1},
///     "response": {"url": "y"}
/// })).unwrap();
/// let flat = record_from_json(serde_json::json!({
///     "request__url": "x",
///     "response__url": "y",
///     "id": 1
/// })).unwrap();
/// assert_eq!(unnest(&nested), flat);
/// ```
pub fn unnest(nested: &Record) -> Record {
    shorten_keys(flatten(nested))
}

/// Applies the leaf-name disambiguation rule to a flat record.
pub fn shorten_keys(flat: Record) -> Record {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in flat.keys() {
        *counts.entry(last_segment(key).to_string()).or_default() += 1;
    }
    flat.into_iter()
        .map(|(key, value)| {
            let leaf = last_segment(&key);
            if counts.get(leaf).copied().unwrap_or(0) == 1 {
                (leaf.to_string(), value)
            } else {
                (key, value)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;
    use serde_json::json;

    fn record(json: serde_json::Value) -> Record {
        record_from_json(json).unwrap()
    }

    #[test]
    fn parse_splits_on_separator() {
        let path = KeyPath::parse("a__b__c");
        assert_eq!(path.segments(), ["a", "b", "c"]);
        assert_eq!(path.last_segment(), "c");
        assert_eq!(path.to_key(), "a__b__c");
    }

    #[test]
    fn parse_keeps_single_underscores() {
        assert_eq!(KeyPath::parse("a___id").segments(), ["a", "_id"]);
        assert_eq!(KeyPath::parse("mime_type").segments(), ["mime_type"]);
    }

    #[test]
    fn parse_is_lenient_with_empty_segments() {
        assert_eq!(KeyPath::parse("a____b").segments(), ["a", "", "b"]);
        assert_eq!(KeyPath::parse("__typename").segments(), ["", "typename"]);
    }

    #[test]
    fn parse_strict_rejects_malformed_keys() {
        assert!(matches!(
            KeyPath::parse_strict(""),
            Err(LookupError::InvalidPath { reason: "empty key", .. })
        ));
        assert!(KeyPath::parse_strict("a____b").is_err());
        assert!(KeyPath::parse_strict("a__").is_err());
        assert!(KeyPath::parse_strict("__a").is_err());
        assert!(KeyPath::parse_strict("a__b").is_ok());
    }

    #[test]
    fn from_segments_addresses_names_containing_separator() {
        let data = record(json!({"__typename": "User", "meta": {"a__b": 1}}));
        let path = KeyPath::from_segments(["__typename"]);
        assert_eq!(path.resolve(&data), Some(&Value::from("User")));

        let nested = KeyPath::from_segments(["meta", "a__b"]);
        assert_eq!(nested.resolve(&data), Some(&Value::from(1)));
        // The string form is ambiguous and resolves differently.
        assert_eq!(resolve(&data, &nested.to_key()), None);
    }

    #[test]
    fn resolve_descends_nested_maps() {
        let data = record(json!({"a": "A", "p": {"q": "Q"}, "x": {"y": {"z": "Z"}}}));
        assert_eq!(resolve(&data, "a"), Some(&Value::from("A")));
        assert_eq!(resolve(&data, "p__q"), Some(&Value::from("Q")));
        assert_eq!(resolve(&data, "x__y__z"), Some(&Value::from("Z")));
    }

    #[test]
    fn resolve_missing_is_absent() {
        let data = record(json!({"a": "A", "p": {"q": "Q"}, "n": null}));
        assert_eq!(resolve(&data, "missing"), None);
        assert_eq!(resolve(&data, "p__missing"), None);
        assert_eq!(resolve(&data, "missing__deeper"), None);
        // Descending into a scalar is absent, not an error
        assert_eq!(resolve(&data, "a__b"), None);
        // Present null is not absent
        assert_eq!(resolve(&data, "n"), Some(&Value::Null));
    }

    #[test]
    fn last_segment_of_keys() {
        assert_eq!(last_segment("a__b__c"), "c");
        assert_eq!(last_segment("a"), "a");
        assert_eq!(last_segment("a__"), "");
    }

    #[test]
    fn last_segment_agrees_with_parse() {
        for key in ["meta___id", "a____b", "__typename", "x__y___z"] {
            assert_eq!(last_segment(key), KeyPath::parse(key).last_segment());
        }
        assert_eq!(last_segment("meta___id"), "_id");
    }

    #[test]
    fn nest_builds_all_levels() {
        let flat = record(json!({"a": "hello", "b__c": "world", "x__y__z": 1}));
        assert_eq!(
            nest(flat),
            record(json!({"a": "hello", "b": {"c": "world"}, "x": {"y": {"z": 1}}}))
        );
    }

    #[test]
    fn nest_merges_shared_prefixes() {
        let flat = record(json!({
            "request__url": "http://example.com",
            "request__headers": [],
            "response__status": 404
        }));
        assert_eq!(
            nest(flat),
            record(json!({
                "request": {"url": "http://example.com", "headers": []},
                "response": {"status": 404}
            }))
        );
    }

    #[test]
    fn nest_merges_whole_map_with_qualified_entry() {
        let flat = record(json!({"t": {"wait": 1, "dns": 2}, "t__wait": 1}));
        assert_eq!(nest(flat), record(json!({"t": {"wait": 1, "dns": 2}})));
    }

    #[test]
    fn flatten_qualifies_every_leaf() {
        let nested = record(json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}, "empty": {}}));
        assert_eq!(
            flatten(&nested),
            record(json!({"a": 1, "b__c": 2, "b__d__e": 3, "empty": {}}))
        );
    }

    #[test]
    fn nest_inverts_flatten() {
        let nested = record(json!({"a": 1, "b": {"c": [1, 2], "d": {"e": null}}, "empty": {}}));
        assert_eq!(nest(flatten(&nested)), nested);
    }

    #[test]
    fn shorten_keys_keeps_collisions_qualified() {
        let flat = record(json!({"a__p": "yay", "b__p": "no", "c__z": "dunno"}));
        assert_eq!(
            shorten_keys(flat),
            record(json!({"a__p": "yay", "b__p": "no", "z": "dunno"}))
        );
    }

    #[test]
    fn shorten_keys_counts_top_level_leaves() {
        let flat = record(json!({"p": 1, "a__p": 2}));
        assert_eq!(shorten_keys(flat.clone()), flat);
    }

    #[test]
    fn unnest_then_nest_restores_colliding_branches() {
        let nested = record(json!({"request": {"url": "x"}, "response": {"url": "y"}}));
        let flat = unnest(&nested);
        assert_eq!(flat, record(json!({"request__url": "x", "response__url": "y"})));
        assert_eq!(nest(flat), nested);
    }

    #[test]
    fn unnest_shortens_unique_leaves() {
        let nested = record(json!({"request": {"url": "x", "id": 1}, "response": {"url": "y"}}));
        assert_eq!(
            unnest(&nested),
            record(json!({"request__url": "x", "response__url": "y", "id": 1}))
        );
    }

    #[test]
    fn unnest_keeps_leading_underscore_in_leaf_names() {
        let nested = record(json!({"meta": {"_id": 7}}));
        assert_eq!(unnest(&nested), record(json!({"_id": 7})));
    }

    #[test]
    fn underscore_leaf_does_not_collide_with_plain_leaf() {
        let nested = record(json!({"meta": {"_id": 1}, "doc": {"id": 2}}));
        assert_eq!(unnest(&nested), record(json!({"_id": 1, "id": 2})));
    }
}
