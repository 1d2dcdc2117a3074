//! Lookup operators and their comparison semantics.
//!
//! The [`Op`] enum is the closed set of operator tags that may appear as the
//! last segment of a compound key (`status__gte`). Each operator compares a
//! resolved field value against a literal [`Operand`].
//!
//! | Tag | Semantics | Absent field |
//! |-----|-----------|--------------|
//! | `exact` | structural equality | matches only a `Null` operand |
//! | `neq` | negation of `exact` | `true` unless operand is `Null` |
//! | `contains`, `icontains` | substring (list element / map key for `contains`) | `false` |
//! | `startswith`, `istartswith`, `endswith`, `iendswith` | prefix / suffix | `false` |
//! | `in` | membership in a list, text or map operand | `false` |
//! | `gt`, `gte`, `lt`, `lte` | natural ordering | `false` |
//! | `regex` | unanchored regex search | `false` |
//! | `filter` | nested predicate matches at least one list element | `false` |

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{LookupError, Result};
use crate::lookup::Operand;
use crate::value::Value;

/// Comparison operator for a lookup.
///
/// Operators are grouped by the types they support:
/// - **Universal**: `Exact`, `Neq`
/// - **Text**: `Contains`, `IContains`, `StartsWith`, `IStartsWith`,
///   `EndsWith`, `IEndsWith`, `Regex`
/// - **Membership**: `In`
/// - **Ordering**: `Gt`, `Gte`, `Lt`, `Lte`
/// - **Subquery**: `Filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // Universal operators
    /// Equal (exact match).
    Exact,
    /// Not equal.
    Neq,

    // Text operators
    /// Text contains substring.
    Contains,
    /// Case-insensitive `Contains`.
    IContains,
    /// Text starts with prefix.
    StartsWith,
    /// Case-insensitive `StartsWith`.
    IStartsWith,
    /// Text ends with suffix.
    EndsWith,
    /// Case-insensitive `EndsWith`.
    IEndsWith,
    /// Text matches a regular expression somewhere.
    Regex,

    /// Value is a member of the operand.
    In,

    // Ordering operators
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,

    /// At least one record in a list field matches a nested predicate.
    Filter,
}

impl Op {
    /// Every operator, in declaration order.
    pub const ALL: [Op; 15] = [
        Op::Exact,
        Op::Neq,
        Op::Contains,
        Op::IContains,
        Op::StartsWith,
        Op::IStartsWith,
        Op::EndsWith,
        Op::IEndsWith,
        Op::Regex,
        Op::In,
        Op::Gt,
        Op::Gte,
        Op::Lt,
        Op::Lte,
        Op::Filter,
    ];

    /// Parses an operator tag, as written after the last separator.
    ///
    /// Returns `None` for anything that is not a known tag.
    pub fn from_tag(tag: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.as_str() == tag)
    }

    /// Returns the tag of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Exact => "exact",
            Op::Neq => "neq",
            Op::Contains => "contains",
            Op::IContains => "icontains",
            Op::StartsWith => "startswith",
            Op::IStartsWith => "istartswith",
            Op::EndsWith => "endswith",
            Op::IEndsWith => "iendswith",
            Op::Regex => "regex",
            Op::In => "in",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Filter => "filter",
        }
    }

    /// Returns `true` if this operator requires a text operand.
    pub fn is_text_op(self) -> bool {
        matches!(
            self,
            Op::Contains
                | Op::IContains
                | Op::StartsWith
                | Op::IStartsWith
                | Op::EndsWith
                | Op::IEndsWith
        )
    }

    /// Returns `true` if this operator compares by natural ordering.
    pub fn is_ordering_op(self) -> bool {
        matches!(self, Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// Returns `true` for the case-folding text variants.
    pub fn is_case_insensitive(self) -> bool {
        matches!(self, Op::IContains | Op::IStartsWith | Op::IEndsWith)
    }

    /// Evaluates an ordering operator given the ordering of value vs operand.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Exact => ordering == Ordering::Equal,
            Op::Neq => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false, // Not an ordering-based operator
        }
    }

    /// Applies this operator to a resolved field value.
    ///
    /// `value` is `None` when the field is absent from the record.
    pub fn apply(self, value: Option<&Value>, operand: &Operand) -> Result<bool> {
        match self {
            Op::Exact => self.exact(value, operand),
            Op::Neq => self.exact(value, operand).map(|matched| !matched),
            Op::Contains
            | Op::IContains
            | Op::StartsWith
            | Op::IStartsWith
            | Op::EndsWith
            | Op::IEndsWith => {
                let needle = match operand {
                    Operand::Value(Value::Text(needle)) => needle,
                    other => return Err(LookupError::mismatch(self.as_str(), "text", other.kind())),
                };
                match value {
                    None | Some(Value::Null) => Ok(false),
                    Some(value) => self.match_text(value, needle),
                }
            }
            Op::Regex => self.match_regex(value, operand),
            Op::In => self.match_in(value, operand),
            Op::Gt | Op::Gte | Op::Lt | Op::Lte => {
                let bound = self.value_operand(operand)?;
                match value {
                    None | Some(Value::Null) => Ok(false),
                    Some(value) => Ok(compare_ordered(self, value, bound)?
                        .is_some_and(|ordering| self.eval_ordering(ordering))),
                }
            }
            Op::Filter => self.match_filter(value, operand),
        }
    }

    fn value_operand(self, operand: &Operand) -> Result<&Value> {
        match operand {
            Operand::Value(value) => Ok(value),
            other => Err(LookupError::mismatch(self.as_str(), "value", other.kind())),
        }
    }

    fn exact(self, value: Option<&Value>, operand: &Operand) -> Result<bool> {
        let expected = self.value_operand(operand)?;
        Ok(match value {
            Some(value) => value == expected,
            None => expected.is_null(),
        })
    }

    fn match_text(self, value: &Value, needle: &str) -> Result<bool> {
        match (self, value) {
            (Op::Contains, Value::List(items)) => {
                Ok(items.iter().any(|item| item.as_str() == Some(needle)))
            }
            (Op::Contains, Value::Map(fields)) => Ok(fields.contains_key(needle)),
            (_, Value::Text(text)) if self.is_case_insensitive() => {
                let text = text.to_lowercase();
                let needle = needle.to_lowercase();
                Ok(text_test(self, &text, &needle))
            }
            (_, Value::Text(text)) => Ok(text_test(self, text, needle)),
            (Op::Contains, other) => Err(LookupError::mismatch(
                self.as_str(),
                "text, list or map",
                other.kind(),
            )),
            (_, other) => Err(LookupError::mismatch(self.as_str(), "text", other.kind())),
        }
    }

    /// Returns the text a regex is searched in, or `None` when the field is
    /// absent or null.
    pub(crate) fn regex_subject(self, value: Option<&Value>) -> Result<Option<&str>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text)),
            Some(other) => Err(LookupError::mismatch(self.as_str(), "text", other.kind())),
        }
    }

    fn match_regex(self, value: Option<&Value>, operand: &Operand) -> Result<bool> {
        let Some(text) = self.regex_subject(value)? else {
            return Ok(false);
        };
        match operand {
            Operand::Regex(regex) => Ok(regex.is_match(text)),
            Operand::Value(Value::Text(pattern)) => Ok(Regex::new(pattern)?.is_match(text)),
            other => Err(LookupError::mismatch(
                self.as_str(),
                "regex or text pattern",
                other.kind(),
            )),
        }
    }

    fn match_in(self, value: Option<&Value>, operand: &Operand) -> Result<bool> {
        match operand {
            Operand::Value(Value::List(items)) => Ok(value.is_some_and(|v| items.contains(v))),
            Operand::Value(Value::Map(fields)) => {
                Ok(value.and_then(Value::as_str).is_some_and(|key| fields.contains_key(key)))
            }
            Operand::Value(Value::Text(haystack)) => match value {
                None | Some(Value::Null) => Ok(false),
                Some(Value::Text(text)) => Ok(haystack.contains(text.as_str())),
                Some(other) => Err(LookupError::mismatch(self.as_str(), "text", other.kind())),
            },
            other => Err(LookupError::mismatch(
                self.as_str(),
                "list, text or map",
                other.kind(),
            )),
        }
    }

    fn match_filter(self, value: Option<&Value>, operand: &Operand) -> Result<bool> {
        let predicate = match operand {
            Operand::Predicate(predicate) => predicate,
            other => return Err(LookupError::mismatch(self.as_str(), "predicate", other.kind())),
        };
        let items = match value {
            None => return Ok(false),
            Some(Value::List(items)) => items,
            Some(other) => return Err(LookupError::mismatch(self.as_str(), "list", other.kind())),
        };
        for item in items {
            let record = item
                .as_map()
                .ok_or_else(|| LookupError::mismatch(self.as_str(), "list of maps", item.kind()))?;
            if predicate.evaluate(record)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn text_test(op: Op, text: &str, needle: &str) -> bool {
    match op {
        Op::Contains | Op::IContains => text.contains(needle),
        Op::StartsWith | Op::IStartsWith => text.starts_with(needle),
        Op::EndsWith | Op::IEndsWith => text.ends_with(needle),
        _ => false,
    }
}

/// Orders a field value against an operand for the ordering operators.
///
/// Numbers, text, booleans and lists (lexicographically) are comparable with
/// their own kind. Any other pairing is a type mismatch. `Ok(None)` means the
/// pair is unordered (NaN).
fn compare_ordered(op: Op, value: &Value, bound: &Value) -> Result<Option<Ordering>> {
    match (value, bound) {
        (Value::Number(a), Value::Number(b)) => Ok(a.compare(*b)),
        (Value::Text(a), Value::Text(b)) => Ok(Some(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare_ordered(op, x, y)? {
                    Some(Ordering::Equal) => continue,
                    other => return Ok(other),
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        (value, bound) => Err(LookupError::mismatch(op.as_str(), value.kind(), bound.kind())),
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
