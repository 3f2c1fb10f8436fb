//! Row predicates used by selection
//!
//! A condition reads `attribute <op> literal`. Operators are located by plain
//! substring search, tried in the fixed order `>=`, `<=`, `>`, `<`, `=`, `!=`.
//! The first operator that occurs exactly once with non-blank text on both
//! sides wins. Because `=` is tried before `!=`, `a!=1` compares attribute
//! `a!` with `=`. A condition with no usable operator holds for every row.

use std::cmp::Ordering;
use std::fmt;

use crate::value::{Row, Value, parse_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
    Ne,
}

/// Search order for operator substrings
const OPERATORS: [(&str, CompareOp); 6] = [
    (">=", CompareOp::Ge),
    ("<=", CompareOp::Le),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
    ("=", CompareOp::Eq),
    ("!=", CompareOp::Ne),
];

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A parsed `attribute <op> literal` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub attribute: String,
    pub op: CompareOp,
    pub literal: Value,
}

impl Comparison {
    /// Interpret condition text; `None` if no operator applies
    pub fn parse(condition: &str) -> Option<Self> {
        OPERATORS.iter().find_map(|&(symbol, op)| {
            let mut parts = condition.split(symbol);
            let (Some(lhs), Some(rhs), None) = (parts.next(), parts.next(), parts.next()) else {
                return None;
            };
            let (attribute, literal) = (lhs.trim(), rhs.trim());
            if attribute.is_empty() || literal.is_empty() {
                return None;
            }
            Some(Comparison {
                attribute: attribute.to_string(),
                op,
                literal: parse_literal(literal),
            })
        })
    }

    /// Whether `row` satisfies the comparison. A missing attribute only
    /// satisfies `!=`.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.attribute) else {
            return self.op == CompareOp::Ne;
        };
        let ordering = || value.loose_cmp(&self.literal);
        match self.op {
            CompareOp::Gt => ordering() == Some(Ordering::Greater),
            CompareOp::Lt => ordering() == Some(Ordering::Less),
            CompareOp::Ge => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
            CompareOp::Le => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Eq => value.loose_eq(&self.literal),
            CompareOp::Ne => !value.loose_eq(&self.literal),
        }
    }
}

/// Numbers stay numbers; anything else is a string with its quotes removed
fn parse_literal(text: &str) -> Value {
    match parse_number(text) {
        Some(n) => Value::Number(n),
        None => Value::String(text.trim_matches(['\'', '"']).to_string()),
    }
}

/// Compiled form of a selection condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Comparison),
    /// No recognised operator: every row passes
    Always,
}

impl Condition {
    pub fn parse(condition: &str) -> Self {
        match Comparison::parse(condition) {
            Some(cmp) => Condition::Compare(cmp),
            None => {
                log::debug!("condition {condition:?} has no comparison operator, passing all rows");
                Condition::Always
            }
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::Compare(cmp) => cmp.matches(row),
            Condition::Always => true,
        }
    }
}

/// Evaluate a condition string against one row
pub fn evaluate(row: &Row, condition: &str) -> bool {
    Condition::parse(condition).matches(row)
}
