//! Field projection: reducing and reshaping records.
//!
//! A [`Projection`] resolves a list of key paths against each record. Paths
//! that do not resolve are kept as explicit `Null` entries so callers can tell
//! "requested but missing" apart from "not requested".

use std::iter::FusedIterator;

use crate::error::Result;
use crate::filter::{source, Source};
use crate::path::{nest_entries, shorten_keys, KeyPath};
use crate::value::{Record, Value};

/// Output shape of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    /// Rebuild nested maps from the selected paths.
    #[default]
    Nested,
    /// Keep a flat record, keyed by leaf name where unambiguous and by the
    /// full compound key otherwise.
    Flattened,
}

/// A set of selected paths and the shape to produce.
///
/// # Example
///
/// ```
/// use standout_lookup::{Projection, Shape, record_from_json};
///
/// let record = record_from_json(serde_json::json!({
///     "request": {"url": "x", "method": "GET"},
///     "response": {"status": 200}
/// })).unwrap();
///
/// let nested = Projection::new(["request__url", "response__status"], Shape::Nested);
/// assert_eq!(
///     nested.apply(&record),
///     record_from_json(serde_json::json!({
///         "request": {"url": "x"},
///         "response": {"status": 200}
///     })).unwrap()
/// );
///
/// let flat = Projection::new(["request__url", "response__status"], Shape::Flattened);
/// assert_eq!(
///     flat.apply(&record),
///     record_from_json(serde_json::json!({"url": "x", "status": 200})).unwrap()
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    paths: Vec<KeyPath>,
    shape: Shape,
}

impl Projection {
    /// Creates a projection over the given paths.
    pub fn new<I, P>(paths: I, shape: Shape) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPath>,
    {
        Projection {
            paths: paths.into_iter().map(Into::into).collect(),
            shape,
        }
    }

    /// Returns the selected paths.
    pub fn paths(&self) -> &[KeyPath] {
        &self.paths
    }

    /// Returns the output shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Projects a single record.
    pub fn apply(&self, record: &Record) -> Record {
        let selected = self
            .paths
            .iter()
            .map(|path| (path, path.resolve(record).cloned().unwrap_or(Value::Null)));
        match self.shape {
            Shape::Nested => nest_entries(selected.map(|(path, value)| (path.clone(), value))),
            Shape::Flattened => {
                shorten_keys(selected.map(|(path, value)| (path.to_key(), value)).collect())
            }
        }
    }
}

/// Lazy projection over a fallible record stream.
#[derive(Debug)]
pub struct Project<I> {
    upstream: I,
    projection: Projection,
}

impl<I> Project<I>
where
    I: Iterator<Item = Result<Record>>,
{
    /// Wraps `upstream`, projecting every record it yields.
    pub fn new(upstream: I, projection: Projection) -> Self {
        Project {
            upstream,
            projection,
        }
    }

    /// Returns the projection applied by this adapter.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

impl<I> Iterator for Project<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let projection = &self.projection;
        self.upstream
            .next()
            .map(|record| record.map(|record| projection.apply(&record)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}

impl<I> FusedIterator for Project<I> where I: FusedIterator<Item = Result<Record>> {}

/// Projects plain records onto the given paths, lazily.
pub fn project_records<I, P, R>(records: R, paths: I, shape: Shape) -> Project<Source<R::IntoIter>>
where
    R: IntoIterator<Item = Record>,
    I: IntoIterator<Item = P>,
    P: Into<KeyPath>,
{
    Project::new(source(records), Projection::new(paths, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;
    use serde_json::json;

    fn record(json: serde_json::Value) -> Record {
        record_from_json(json).unwrap()
    }

    fn entry() -> Record {
        record(json!({
            "request": {"url": "http://example.com", "headers": [{"name": "Connection"}], "id": 1},
            "response": {"status": 404, "headers": [{"name": "Date"}], "url": "http://cdn"}
        }))
    }

    #[test]
    fn nested_whole_branch() {
        let p = Projection::new(["request"], Shape::Nested);
        assert_eq!(
            p.apply(&entry()),
            record(json!({
                "request": {"url": "http://example.com", "headers": [{"name": "Connection"}], "id": 1}
            }))
        );
    }

    #[test]
    fn nested_leaf_paths() {
        let p = Projection::new(["response__status"], Shape::Nested);
        assert_eq!(p.apply(&entry()), record(json!({"response": {"status": 404}})));
    }

    #[test]
    fn missing_fields_become_null() {
        let p = Projection::new(["response__status", "cookies"], Shape::Nested);
        assert_eq!(
            p.apply(&entry()),
            record(json!({"response": {"status": 404}, "cookies": null}))
        );

        let flat = Projection::new(["response__missing", "request__url"], Shape::Flattened);
        assert_eq!(
            flat.apply(&entry()),
            record(json!({"missing": null, "url": "http://example.com"}))
        );
    }

    #[test]
    fn empty_selection_yields_empty_records() {
        let p = Projection::new(Vec::<&str>::new(), Shape::Nested);
        assert_eq!(p.apply(&entry()), Record::new());
    }

    #[test]
    fn flattened_keeps_colliding_leaves_qualified() {
        let p = Projection::new(
            ["request__url", "response__url", "request__id"],
            Shape::Flattened,
        );
        assert_eq!(
            p.apply(&entry()),
            record(json!({
                "request__url": "http://example.com",
                "response__url": "http://cdn",
                "id": 1
            }))
        );
    }

    #[test]
    fn flattened_shortens_unique_leaves() {
        let p = Projection::new(
            ["request__headers", "response__headers", "response__status", "request__url"],
            Shape::Flattened,
        );
        assert_eq!(
            p.apply(&entry()),
            record(json!({
                "url": "http://example.com",
                "request__headers": [{"name": "Connection"}],
                "status": 404,
                "response__headers": [{"name": "Date"}]
            }))
        );
    }

    #[test]
    fn flattened_keeps_map_values_whole() {
        let p = Projection::new(["request"], Shape::Flattened);
        assert_eq!(p.apply(&entry())["request"], entry()["request"]);
    }

    #[test]
    fn flattened_keeps_leading_underscore_leaf() {
        let data = record(json!({"meta": {"_id": 7}, "doc": {"id": 8}}));
        let p = Projection::new(["meta___id"], Shape::Flattened);
        assert_eq!(p.apply(&data), record(json!({"_id": 7})));

        let both = Projection::new(["meta___id", "doc__id"], Shape::Flattened);
        assert_eq!(both.apply(&data), record(json!({"_id": 7, "id": 8})));
    }

    #[test]
    fn explicit_segments_nest_correctly() {
        let data = record(json!({"meta": {"a__b": 1}}));
        let p = Projection::new([KeyPath::from_segments(["meta", "a__b"])], Shape::Nested);
        assert_eq!(p.apply(&data), data);
    }

    #[test]
    fn project_records_is_lazy_and_per_record() {
        let records = vec![
            record(json!({"framework": "Zend", "language": "PHP", "type": "full-stack"})),
            record(json!({"framework": "Slim", "language": "PHP", "type": "micro"})),
        ];
        let mut projected = project_records(records, ["framework", "type"], Shape::Nested);
        assert_eq!(
            projected.next().unwrap().unwrap(),
            record(json!({"framework": "Zend", "type": "full-stack"}))
        );
        assert_eq!(
            projected.next().unwrap().unwrap(),
            record(json!({"framework": "Slim", "type": "micro"}))
        );
        assert!(projected.next().is_none());
    }
}
