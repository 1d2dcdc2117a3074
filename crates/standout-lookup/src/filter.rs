//! Lazy filtering of record streams.
//!
//! [`Filter`] pulls one record at a time from its upstream, evaluates the
//! predicates against it and yields it unchanged if all of them hold. Nothing
//! is buffered, so unbounded sources are fine.
//!
//! Streams carry `Result<Record>` items. The first error, whether from
//! upstream or from evaluating a predicate, is yielded and then the stream
//! ends.

use std::iter::{FusedIterator, Map};

use crate::error::{LookupError, Result};
use crate::predicate::Predicate;
use crate::value::Record;

/// A fallible record stream built from an infallible one.
pub type Source<I> = Map<I, fn(Record) -> Result<Record>>;

fn ok(record: Record) -> Result<Record> {
    Ok(record)
}

/// Lifts a plain record iterator into a fallible record stream.
pub fn source<I>(records: I) -> Source<I::IntoIter>
where
    I: IntoIterator<Item = Record>,
{
    records
        .into_iter()
        .map(ok as fn(Record) -> Result<Record>)
}

/// Tests a record against a set of predicates, implicitly ANDed.
///
/// An empty set matches every record.
pub fn matches_all(predicates: &[Predicate], record: &Record) -> Result<bool> {
    for predicate in predicates {
        if !predicate.evaluate(record)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Lazy filter over a fallible record stream.
///
/// Single pass: once consumed it cannot be restarted. Collect it first if
/// several passes are needed.
#[derive(Debug)]
pub struct Filter<I> {
    upstream: I,
    predicates: Vec<Predicate>,
    done: bool,
}

impl<I> Filter<I>
where
    I: Iterator<Item = Result<Record>>,
{
    /// Wraps `upstream`, keeping records that satisfy every predicate.
    pub fn new(upstream: I, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Filter {
            upstream,
            predicates: predicates.into_iter().collect(),
            done: false,
        }
    }

    /// Returns the predicates applied by this filter.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn fail(&mut self, err: LookupError) -> Option<Result<Record>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<I> Iterator for Filter<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let record = match self.upstream.next()? {
                Ok(record) => record,
                Err(err) => return self.fail(err),
            };
            match matches_all(&self.predicates, &record) {
                Ok(true) => return Some(Ok(record)),
                Ok(false) => continue,
                Err(err) => return self.fail(err),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, self.upstream.size_hint().1)
        }
    }
}

impl<I> FusedIterator for Filter<I> where I: Iterator<Item = Result<Record>> {}

/// Filters plain records by a set of predicates, lazily.
///
/// ```
/// use standout_lookup::{filter_records, record_from_json, Predicate};
///
/// let records = vec![
///     record_from_json(serde_json::json!({"s": "GET", "c": 200})).unwrap(),
///     record_from_json(serde_json::json!({"s": "POST", "c": 404})).unwrap(),
/// ];
/// let ok: Vec<_> = filter_records(records, [Predicate::leaf([("c__exact", 200)])])
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(ok.len(), 1);
/// ```
pub fn filter_records<I>(
    records: I,
    predicates: impl IntoIterator<Item = Predicate>,
) -> Filter<Source<I::IntoIter>>
where
    I: IntoIterator<Item = Record>,
{
    Filter::new(source(records), predicates)
}
