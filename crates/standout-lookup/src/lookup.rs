//! Lookup triples: a field path, an operator and an operand.
//!
//! A [`Lookup`] is usually parsed from a compound key such as
//! `response__status__gte`, where the last segment names the operator.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{LookupError, Result};
use crate::op::Op;
use crate::path::{KeyPath, SEPARATOR};
use crate::predicate::Predicate;
use crate::value::{Number, Record, Value};

/// A single lookup: resolve `path`, then compare with `op` against `operand`.
///
/// # Example
///
/// ```
/// use standout_lookup::{Lookup, Op};
///
/// let lookup = Lookup::parse("response__status__gte", 400);
/// assert_eq!(lookup.path().to_key(), "response__status");
/// assert_eq!(lookup.op(), Op::Gte);
/// ```
#[derive(Debug, Clone)]
pub struct Lookup {
    path: KeyPath,
    op: Op,
    operand: Operand,
    // Text pattern of a regex lookup, compiled on first use
    pattern: OnceLock<std::result::Result<Regex, regex::Error>>,
}

impl Lookup {
    /// Creates a lookup from an explicit path and operator.
    pub fn new(path: impl Into<KeyPath>, op: Op, operand: impl Into<Operand>) -> Self {
        Lookup {
            path: path.into(),
            op,
            operand: operand.into(),
            pattern: OnceLock::new(),
        }
    }

    /// Parses a compound key into a lookup.
    ///
    /// When the last segment is an operator tag it selects the operator and
    /// the rest of the key is the path. Otherwise the whole key is the path
    /// and the operator is [`Op::Exact`], so `request__url` is shorthand for
    /// `request__url__exact`.
    pub fn parse(key: &str, operand: impl Into<Operand>) -> Self {
        let (path, op) = split_key(key);
        Lookup::new(KeyPath::parse(path), op, operand)
    }

    /// Like [`Lookup::parse`], but rejects malformed paths.
    pub fn parse_strict(key: &str, operand: impl Into<Operand>) -> Result<Self> {
        let (path, op) = split_key(key);
        Ok(Lookup::new(KeyPath::parse_strict(path)?, op, operand))
    }

    /// Returns the field path.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Returns the operator.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Returns the operand.
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Evaluates this lookup against a record.
    ///
    /// A text pattern given to [`Op::Regex`] is compiled once, the first time
    /// a record reaches it; an invalid pattern fails every evaluation.
    pub fn evaluate(&self, record: &Record) -> Result<bool> {
        let value = self.path.resolve(record);
        match (self.op, &self.operand) {
            (Op::Regex, Operand::Value(Value::Text(pattern))) => {
                let Some(text) = self.op.regex_subject(value)? else {
                    return Ok(false);
                };
                let regex = self
                    .pattern
                    .get_or_init(|| Regex::new(pattern))
                    .as_ref()
                    .map_err(|err| LookupError::InvalidRegex(err.clone()))?;
                Ok(regex.is_match(text))
            }
            (op, operand) => op.apply(value, operand),
        }
    }
}

// The tag is the last segment as `KeyPath::parse` splits it.
fn split_key(key: &str) -> (&str, Op) {
    key.match_indices(SEPARATOR)
        .last()
        .and_then(|(at, _)| {
            Op::from_tag(&key[at + SEPARATOR.len()..]).map(|op| (&key[..at], op))
        })
        .unwrap_or((key, Op::Exact))
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}={}", self.path, SEPARATOR, self.op, self.operand)
    }
}

/// The literal side of a lookup.
///
/// Unlike field values, operands may also be a compiled regex (for
/// [`Op::Regex`]) or a nested predicate (for [`Op::Filter`]). Whether an
/// operand suits its operator is only checked when a record is evaluated.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Plain value.
    Value(Value),
    /// Compiled regular expression.
    Regex(Regex),
    /// Nested predicate.
    Predicate(Predicate),
}

impl Operand {
    /// Returns the name of this operand's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Value(value) => value.kind(),
            Operand::Regex(_) => "regex",
            Operand::Predicate(_) => "predicate",
        }
    }

    /// Extracts the plain value, if present.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Operand::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(value) => write!(f, "{value}"),
            Operand::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            Operand::Predicate(predicate) => write!(f, "{predicate}"),
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Regex> for Operand {
    fn from(regex: Regex) -> Self {
        Operand::Regex(regex)
    }
}

impl From<Predicate> for Operand {
    fn from(predicate: Predicate) -> Self {
        Operand::Predicate(predicate)
    }
}

impl From<serde_json::Value> for Operand {
    fn from(json: serde_json::Value) -> Self {
        Operand::Value(json.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::Value(items.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(opt: Option<T>) -> Self {
        Operand::Value(opt.into())
    }
}

macro_rules! operand_from_value {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Operand {
                fn from(v: $source) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

operand_from_value!(
    &str, String, bool, Number, Record, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32,
    f64
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;
    use serde_json::json;

    fn entry() -> Record {
        record_from_json(json!({
            "request": {"url": "http://example.com"},
            "response": {"status": 404}
        }))
        .unwrap()
    }

    #[test]
    fn parse_operator_suffix() {
        let lookup = Lookup::parse("request__url__contains", ".com");
        assert_eq!(lookup.path().segments(), ["request", "url"]);
        assert_eq!(lookup.op(), Op::Contains);
        assert_eq!(lookup.operand().as_value(), Some(&Value::from(".com")));
    }

    #[test]
    fn missing_suffix_is_exact_on_whole_key() {
        let lookup = Lookup::parse("response__status", 404);
        assert_eq!(lookup.path().to_key(), "response__status");
        assert_eq!(lookup.op(), Op::Exact);
        assert!(lookup.evaluate(&entry()).unwrap());
    }

    #[test]
    fn unrecognized_suffix_is_exact_on_whole_key() {
        let lookup = Lookup::parse("response__status__eq", 404);
        assert_eq!(lookup.path().segments(), ["response", "status", "eq"]);
        assert_eq!(lookup.op(), Op::Exact);
        // Resolves to nothing, so only a null operand matches
        assert!(!lookup.evaluate(&entry()).unwrap());
        assert!(Lookup::parse("response__status__eq", Value::Null)
            .evaluate(&entry())
            .unwrap());
    }

    #[test]
    fn tag_is_the_last_parsed_segment() {
        let record = record_from_json(json!({"meta": {"_in": 1, "_id": 2}})).unwrap();

        let lookup = Lookup::parse("meta___in", 1);
        assert_eq!(lookup.path().segments(), ["meta", "_in"]);
        assert_eq!(lookup.op(), Op::Exact);
        assert!(lookup.evaluate(&record).unwrap());

        let lookup = Lookup::parse("meta___id__in", vec![2, 3]);
        assert_eq!(lookup.path().segments(), ["meta", "_id"]);
        assert_eq!(lookup.op(), Op::In);
        assert!(lookup.evaluate(&record).unwrap());
    }

    #[test]
    fn text_regex_compiles_on_first_match() {
        let lookup = Lookup::parse("request__url__regex", "^http://");
        assert!(lookup.pattern.get().is_none());
        // An absent field never needs the pattern
        assert!(!lookup.evaluate(&Record::new()).unwrap());
        assert!(lookup.pattern.get().is_none());

        assert!(lookup.evaluate(&entry()).unwrap());
        let compiled = lookup.pattern.get().unwrap().as_ref().unwrap().as_str().to_string();
        assert_eq!(compiled, "^http://");
        assert!(lookup.evaluate(&entry()).unwrap());
    }

    #[test]
    fn invalid_text_regex_fails_every_evaluation() {
        let lookup = Lookup::parse("request__url__regex", "(unclosed");
        for _ in 0..2 {
            assert!(matches!(
                lookup.evaluate(&entry()),
                Err(LookupError::InvalidRegex(_))
            ));
        }
        assert!(!lookup.evaluate(&Record::new()).unwrap());
    }

    #[test]
    fn single_segment_keys() {
        let record = record_from_json(json!({"exact": 1, "in": 2})).unwrap();
        // A bare operator name is a field name
        assert!(Lookup::parse("exact", 1).evaluate(&record).unwrap());
        // A field named like an operator needs an explicit path
        assert!(Lookup::new("in", Op::Exact, 2).evaluate(&record).unwrap());
    }

    #[test]
    fn parse_strict_rejects_empty_segments() {
        assert!(Lookup::parse_strict("request__url__exact", "x").is_ok());
        assert!(Lookup::parse_strict("request____url", "x").is_err());
        assert!(Lookup::parse_strict("__exact", "x").is_err());
        // Lenient parse treats them literally
        assert!(!Lookup::parse("request____url", "x").evaluate(&entry()).unwrap());
    }

    #[test]
    fn evaluate_absent_field() {
        let record = entry();
        assert!(!Lookup::parse("request_url__exact", "http://example.org")
            .evaluate(&record)
            .unwrap());
        assert!(Lookup::parse("request_url__neq", "http://example.org")
            .evaluate(&record)
            .unwrap());
        assert!(Lookup::parse("response_unknown", Value::Null)
            .evaluate(&record)
            .unwrap());
        assert!(!Lookup::parse("response_unknown__gt", 1)
            .evaluate(&record)
            .unwrap());
    }

    #[test]
    fn operand_kinds() {
        assert_eq!(Operand::from("a").kind(), "text");
        assert_eq!(Operand::from(vec![1, 2]).kind(), "list");
        assert_eq!(Operand::from(Regex::new("a").unwrap()).kind(), "regex");
        assert_eq!(Operand::from(Predicate::all()).kind(), "predicate");
        assert_eq!(Operand::from(None::<i64>).kind(), "null");
    }

    #[test]
    fn display() {
        assert_eq!(
            Lookup::parse("response__status__gte", 400).to_string(),
            "response__status__gte=400"
        );
        assert_eq!(
            Lookup::new("url", Op::Regex, Regex::new("^http").unwrap()).to_string(),
            "url__regex=/^http/"
        );
    }
}
