//! Lookup - QuerySet-style filtering over in-memory nested records.
//!
//! Lookup lets you query collections of JSON-like records with keyword
//! lookups such as `response__status__gte=400`. It supports:
//!
//! - Compound keys that walk nested maps with the `__` separator
//! - Rich operators: equality, text matching, regex, membership, ordering
//! - Composable predicates: AND, OR, NOT, and nested list matching
//! - Lazy, single-pass pipelines over finite or unbounded sources
//! - Projection into nested or flattened records
//!
//! # Quick Start
//!
//! ```rust
//! use standout_lookup::{resolve, Collection, Dir, Predicate, Value};
//! use serde_json::json;
//!
//! let entries = Collection::from_json(json!([
//!     {"request": {"url": "http://example.com/"}, "response": {"status": 200}},
//!     {"request": {"url": "http://example.com/missing"}, "response": {"status": 404}},
//!     {"request": {"url": "http://cdn.example.com/a.js"}, "response": {"status": 500}},
//! ])).unwrap();
//!
//! let failed = entries
//!     .items()
//!     .filter(Predicate::leaf([("response__status__gte", 400)]))
//!     .exclude(Predicate::leaf([("request__url__contains", "cdn")]))
//!     .select(["request__url"])
//!     .to_vec()
//!     .unwrap();
//!
//! assert_eq!(failed.len(), 1);
//! assert_eq!(
//!     resolve(&failed[0], "request__url").and_then(Value::as_str),
//!     Some("http://example.com/missing"),
//! );
//!
//! let worst = entries.items().order_by("response__status", Dir::Desc).first().unwrap().unwrap();
//! assert_eq!(resolve(&worst, "response__status"), Some(&Value::from(500)));
//! ```
//!
//! # Lookup Keys
//!
//! A key is a path optionally followed by an operator tag:
//!
//! ```text
//! response__headers__contains = "Date"
//! └──── path ─────┘└── op ──┘
//! ```
//!
//! When the last segment is not a known tag the whole key is the path and
//! the operator is `exact`.
//!
//! # Predicate Semantics
//!
//! Lookups inside one leaf are ANDed. Leaves combine with `&`, `|` and `!`
//! into a tree that is never mutated; combining shares the operands.
//!
//! A path that does not resolve never raises. It simply fails to match,
//! except for `exact` with a null operand. Operand type errors are raised
//! lazily, when the first record is evaluated.
//!
//! # Operators
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `exact`, `neq` | Equality, numbers compare across representations |
//! | `contains`, `icontains` | Substring; list element or map key for `contains` |
//! | `startswith`, `istartswith`, `endswith`, `iendswith` | Text affixes |
//! | `regex` | Regex search, compiled or text pattern |
//! | `in` | Membership in a list, substring of text, key of a map |
//! | `gt`, `gte`, `lt`, `lte` | Ordering within one kind |
//! | `filter` | Some element of a list of maps matches a predicate |

mod error;
mod filter;
mod lookup;
mod op;
mod ordering;
mod path;
mod predicate;
mod projection;
mod query;
mod value;

// Re-export public API
pub use error::{LookupError, Result};
pub use filter::{filter_records, matches_all, source, Filter, Source};
pub use lookup::{Lookup, Operand};
pub use op::Op;
pub use ordering::{compare_by_orderings, compare_values, Dir, OrderBy};
pub use path::{flatten, last_segment, nest, resolve, shorten_keys, unnest, KeyPath, SEPARATOR};
pub use predicate::{Combinator, Predicate};
pub use projection::{project_records, Project, Projection, Shape};
pub use query::{wrap, Collection, QuerySet};
pub use value::{record_from_json, Number, Record, Value};
