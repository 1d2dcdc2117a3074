//! Collection and QuerySet facade.
//!
//! A [`Collection`] owns an immutable set of records. [`Collection::items`]
//! opens a fresh [`QuerySet`] over it; each chained call wraps the previous
//! stage in a new lazy view, so building a query does no work until it is
//! iterated.

use std::fmt;
use std::sync::Arc;

use crate::error::{LookupError, Result};
use crate::filter::{source, Filter};
use crate::lookup::Operand;
use crate::ordering::{compare_by_orderings, Dir, OrderBy};
use crate::path::KeyPath;
use crate::predicate::Predicate;
use crate::projection::{Project, Projection, Shape};
use crate::value::{Record, Value};

/// An immutable, shareable set of records.
///
/// Cloning a collection is cheap and every call to [`Collection::items`]
/// starts an independent query.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Arc<Vec<Record>>,
}

impl Collection {
    /// Wraps already decoded records.
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Collection {
            records: Arc::new(records.into_iter().collect()),
        }
    }

    /// Builds a collection from a decoded JSON array of objects.
    ///
    /// Fails with [`LookupError::TypeMismatch`] if the value is not an array
    /// or any element is not an object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Map(record) => Ok(record),
                    other => Err(LookupError::mismatch("collection", "map", other.kind())),
                })
                .collect::<Result<Vec<_>>>()
                .map(Collection::new),
            other => Err(LookupError::mismatch("collection", "list", other.kind())),
        }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Opens a new query over every record.
    pub fn items(&self) -> QuerySet<'_> {
        QuerySet::new(self.records.iter().cloned())
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Collection::new(iter)
    }
}

/// Wraps records in a [`Collection`].
pub fn wrap(records: impl IntoIterator<Item = Record>) -> Collection {
    Collection::new(records)
}

/// A lazy, chainable query over a stream of records.
///
/// Iterating yields `Result<Record>`: the first evaluation error is yielded
/// and ends the stream. A query set is single pass; collect it with
/// [`QuerySet::to_vec`] when the results are needed more than once.
///
/// # Example
///
/// ```
/// use standout_lookup::{Collection, Predicate, record_from_json};
///
/// let frameworks = Collection::from_json(serde_json::json!([
///     {"framework": "Django", "language": "Python"},
///     {"framework": "Rails", "language": "Ruby"},
///     {"framework": "Sinatra", "language": "Ruby"},
/// ])).unwrap();
///
/// let ruby: Vec<_> = frameworks
///     .items()
///     .filter_by([("language", "Ruby")])
///     .exclude(Predicate::leaf([("framework__startswith", "R")]))
///     .select(["framework"])
///     .to_vec()
///     .unwrap();
///
/// assert_eq!(ruby, vec![record_from_json(serde_json::json!({"framework": "Sinatra"})).unwrap()]);
/// ```
pub struct QuerySet<'a> {
    inner: Box<dyn Iterator<Item = Result<Record>> + 'a>,
}

impl<'a> QuerySet<'a> {
    /// Starts a query over any iterator of records, including unbounded ones.
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'a,
    {
        QuerySet::from_results(source(records))
    }

    /// Starts a query over a fallible record stream.
    pub fn from_results<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Result<Record>>,
        I::IntoIter: 'a,
    {
        QuerySet {
            inner: Box::new(records.into_iter()),
        }
    }

    /// Keeps records matching `predicate`.
    pub fn filter(self, predicate: Predicate) -> Self {
        self.filter_all([predicate])
    }

    /// Keeps records matching every predicate. An empty set keeps everything.
    pub fn filter_all(self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        QuerySet::from_results(Filter::new(self.inner, predicates))
    }

    /// Keeps records matching keyword-style lookups, implicitly ANDed.
    ///
    /// `qs.filter_by([("status__gte", 400)])` is shorthand for
    /// `qs.filter(Predicate::leaf([("status__gte", 400)]))`.
    pub fn filter_by<I, K, V>(self, lookups: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        self.filter(Predicate::leaf(lookups))
    }

    /// Drops records matching `predicate`.
    pub fn exclude(self, predicate: Predicate) -> Self {
        self.filter(predicate.negate())
    }

    /// Projects each record onto `paths`, rebuilding nested maps.
    pub fn select<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPath>,
    {
        self.select_with(paths, Shape::Nested)
    }

    /// Projects each record onto `paths`, producing flat records.
    pub fn select_flat<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPath>,
    {
        self.select_with(paths, Shape::Flattened)
    }

    /// Projects each record onto `paths` with an explicit output shape.
    pub fn select_with<I, P>(self, paths: I, shape: Shape) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPath>,
    {
        QuerySet::from_results(Project::new(self.inner, Projection::new(paths, shape)))
    }

    /// Skips the first `n` records. Errors are never skipped.
    pub fn offset(self, n: usize) -> Self {
        let mut remaining = n;
        QuerySet::from_results(self.inner.filter(move |item| match item {
            Ok(_) if remaining > 0 => {
                remaining -= 1;
                false
            }
            _ => true,
        }))
    }

    /// Yields at most `n` items.
    pub fn limit(self, n: usize) -> Self {
        QuerySet::from_results(self.inner.take(n))
    }

    /// Sorts by a single path.
    ///
    /// See [`QuerySet::order_by_all`].
    pub fn order_by(self, path: impl Into<KeyPath>, dir: Dir) -> Self {
        self.order_by_all([OrderBy::new(path, dir)])
    }

    /// Sorts by several paths, the first being the primary key.
    ///
    /// Sorting needs every upstream record, so the first pull drains the
    /// upstream. The sort is stable; absent and null values sort last. A
    /// later `order_by` call becomes the primary key and earlier orderings
    /// break its ties.
    pub fn order_by_all(self, orderings: impl IntoIterator<Item = OrderBy>) -> Self {
        let orderings: Vec<OrderBy> = orderings.into_iter().collect();
        let upstream = self.inner;
        let sorted = std::iter::once_with(move || -> Vec<Result<Record>> {
            match upstream.collect::<Result<Vec<Record>>>() {
                Ok(mut records) => {
                    records.sort_by(|a, b| compare_by_orderings(a, b, &orderings));
                    records.into_iter().map(Ok).collect()
                }
                Err(err) => vec![Err(err)],
            }
        })
        .flatten();
        QuerySet::from_results(sorted)
    }

    /// Collects all records, stopping at the first error.
    pub fn to_vec(self) -> Result<Vec<Record>> {
        self.collect()
    }

    /// Counts the records, stopping at the first error.
    pub fn count(mut self) -> Result<usize> {
        self.inner.try_fold(0, |n, item| item.map(|_| n + 1))
    }

    /// Returns the first record, if any.
    pub fn first(mut self) -> Result<Option<Record>> {
        self.inner.next().transpose()
    }

    /// Returns `true` if at least one record remains.
    pub fn exists(self) -> Result<bool> {
        self.first().map(|record| record.is_some())
    }
}

impl Iterator for QuerySet<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl fmt::Debug for QuerySet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet").finish_non_exhaustive()
    }
}
