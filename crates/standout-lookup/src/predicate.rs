//! Composable boolean predicates over records.
//!
//! A [`Predicate`] is either a leaf (a set of [`Lookup`]s that must all hold)
//! or a compound node combining child predicates with AND or OR. Either kind
//! carries a negation flag.
//!
//! Predicates are persistent: combining or negating never touches the
//! originals. Nodes are reference counted, so a sub-predicate reused in
//! several trees is shared rather than copied.
//!
//! ```
//! use standout_lookup::{Predicate, record_from_json};
//!
//! let record = record_from_json(serde_json::json!({"s": "GET", "c": 404})).unwrap();
//!
//! let client_error = Predicate::leaf([("c__gte", 400), ("c__lt", 500)]);
//! let get = Predicate::leaf([("s", "GET")]);
//!
//! assert!((client_error.clone() & get.clone()).evaluate(&record).unwrap());
//! assert!(!(!client_error | !get).evaluate(&record).unwrap());
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use crate::error::Result;
use crate::lookup::{Lookup, Operand};
use crate::op::Op;
use crate::path::KeyPath;
use crate::value::Record;

/// How a compound node combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    /// Every child must hold (empty = true).
    #[default]
    And,
    /// At least one child must hold (empty = false).
    Or,
}

impl Combinator {
    /// Returns the display name of this combinator.
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum Node {
    Leaf(Vec<Lookup>),
    Compound {
        combinator: Combinator,
        children: Vec<Predicate>,
    },
}

/// An immutable boolean expression tree.
#[derive(Debug, Clone)]
pub struct Predicate {
    node: Arc<Node>,
    negated: bool,
}

impl Predicate {
    fn from_node(node: Node) -> Self {
        Predicate {
            node: Arc::new(node),
            negated: false,
        }
    }

    /// Builds a leaf from `(compound key, operand)` pairs, implicitly ANDed.
    ///
    /// Each key is parsed with [`Lookup::parse`], so the last segment may
    /// name an operator (`status__gte`).
    pub fn leaf<I, K, V>(lookups: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        Predicate::from_lookups(
            lookups
                .into_iter()
                .map(|(key, operand)| Lookup::parse(key.as_ref(), operand)),
        )
    }

    /// Like [`Predicate::leaf`], but rejects malformed keys.
    pub fn try_leaf<I, K, V>(lookups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        let lookups = lookups
            .into_iter()
            .map(|(key, operand)| Lookup::parse_strict(key.as_ref(), operand))
            .collect::<Result<Vec<_>>>()?;
        Ok(Predicate::from_lookups(lookups))
    }

    /// Builds a leaf from already constructed lookups.
    pub fn from_lookups(lookups: impl IntoIterator<Item = Lookup>) -> Self {
        Predicate::from_node(Node::Leaf(lookups.into_iter().collect()))
    }

    /// Builds a single-lookup leaf with an explicit path and operator.
    pub fn lookup(path: impl Into<KeyPath>, op: Op, operand: impl Into<Operand>) -> Self {
        Predicate::from_lookups([Lookup::new(path, op, operand)])
    }

    /// The empty leaf, which matches every record.
    pub fn all() -> Self {
        Predicate::from_lookups(Vec::new())
    }

    /// Combines predicates so that all of them must hold.
    pub fn all_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::from_node(Node::Compound {
            combinator: Combinator::And,
            children: predicates.into_iter().collect(),
        })
    }

    /// Combines predicates so that at least one must hold.
    pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::from_node(Node::Compound {
            combinator: Combinator::Or,
            children: predicates.into_iter().collect(),
        })
    }

    /// Returns a new node requiring both `self` and `other`.
    pub fn and(&self, other: &Predicate) -> Self {
        Predicate::all_of([self.clone(), other.clone()])
    }

    /// Returns a new node requiring `self` or `other`.
    pub fn or(&self, other: &Predicate) -> Self {
        Predicate::any_of([self.clone(), other.clone()])
    }

    /// Returns a copy with the negation flag flipped.
    ///
    /// The copy shares its node with `self`; negating twice yields a
    /// predicate equivalent to the original.
    pub fn negate(&self) -> Self {
        Predicate {
            node: Arc::clone(&self.node),
            negated: !self.negated,
        }
    }

    /// Returns `true` if this predicate's result is inverted.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Returns `true` for leaf predicates.
    pub fn is_leaf(&self) -> bool {
        matches!(*self.node, Node::Leaf(_))
    }

    /// Returns the combinator of a compound node, or `None` for a leaf.
    pub fn combinator(&self) -> Option<Combinator> {
        match &*self.node {
            Node::Leaf(_) => None,
            Node::Compound { combinator, .. } => Some(*combinator),
        }
    }

    /// Returns the children of a compound node (empty for a leaf).
    pub fn children(&self) -> &[Predicate] {
        match &*self.node {
            Node::Leaf(_) => &[],
            Node::Compound { children, .. } => children,
        }
    }

    /// Returns the lookups of a leaf (empty for a compound node).
    pub fn lookups(&self) -> &[Lookup] {
        match &*self.node {
            Node::Leaf(lookups) => lookups,
            Node::Compound { .. } => &[],
        }
    }

    /// Evaluates this predicate against a record.
    ///
    /// Evaluation short-circuits left to right; an operator error stops it
    /// and is returned.
    pub fn evaluate(&self, record: &Record) -> Result<bool> {
        let result = match &*self.node {
            Node::Leaf(lookups) => try_all(lookups, |lookup| lookup.evaluate(record))?,
            Node::Compound {
                combinator: Combinator::And,
                children,
            } => try_all(children, |child| child.evaluate(record))?,
            Node::Compound {
                combinator: Combinator::Or,
                children,
            } => try_any(children, |child| child.evaluate(record))?,
        };
        Ok(result != self.negated)
    }

    #[cfg(test)]
    fn shares_node_with(&self, other: &Predicate) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

fn try_all<T>(items: &[T], mut test: impl FnMut(&T) -> Result<bool>) -> Result<bool> {
    for item in items {
        if !test(item)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn try_any<T>(items: &[T], mut test: impl FnMut(&T) -> Result<bool>) -> Result<bool> {
    for item in items {
        if test(item)? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::all()
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        Predicate::all_of([self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        Predicate::any_of([self, rhs])
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("NOT ")?;
        }
        match &*self.node {
            Node::Leaf(lookups) if lookups.is_empty() => f.write_str("TRUE"),
            Node::Leaf(lookups) => write_joined(f, lookups, Combinator::And),
            Node::Compound {
                children,
                combinator,
            } => write_joined(f, children, *combinator),
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    combinator: Combinator,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {combinator} ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}
