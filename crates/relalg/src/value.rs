//! Scalar values, rows and relations
//!
//! Relations carry no schema: every row is an ordered attribute map and two
//! rows of the same relation may have different attribute sets.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
}

/// One row: attribute name -> value, in insertion order
pub type Row = IndexMap<String, Value>;

impl Value {
    /// Numeric view of the value, `None` when it has no numeric reading.
    ///
    /// Booleans read as 1/0, strings are trimmed and parsed as decimals
    /// (an empty string reads as 0).
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) if n.is_nan() => None,
            Value::Number(n) => Some(*n),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Some(0.0)
                } else {
                    parse_number(s)
                }
            }
        }
    }

    /// Cross-type tolerant equality: strings compare as strings, booleans as
    /// booleans, every other pairing compares numerically.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => match (self.to_number(), other.to_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Ordering used by `<`, `>`, `<=` and `>=` in conditions.
    ///
    /// Two strings order lexicographically; anything else orders by its
    /// numeric reading. `None` means the values are unordered.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => self.to_number()?.partial_cmp(&other.to_number()?),
        }
    }
}

/// Parse a base-10 literal: optional sign, digits, `.` and an exponent.
/// Spellings such as `inf` or `NaN` are not numbers.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    text.parse::<f64>().ok()
}

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15).then_some(n as i64)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Build a [`Row`] from `name => value` pairs.
///
/// ```
/// let row = relalg::row! { "id" => 1, "name" => "Alice" };
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $(row.insert(::std::string::String::from($name), $crate::Value::from($value));)+
        row
    }};
}

// ============ Relation ============

/// An ordered sequence of rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relation {
    rows: Vec<Row>,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Every attribute name that appears in any row, in first-seen order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: IndexMap<&str, ()> = IndexMap::new();
        for row in &self.rows {
            for name in row.keys() {
                names.entry(name.as_str()).or_insert(());
            }
        }
        names.into_keys().collect()
    }
}

impl FromIterator<Row> for Relation {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Relation {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl From<Vec<Row>> for Relation {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

// ============ Row identity ============

#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyAtom<'a> {
    Bool(bool),
    Number(u64),
    String(&'a str),
}

/// Structural identity of a row: its attribute/value pairs sorted by name.
///
/// Two rows share a key iff they have the same attribute set and equal
/// values, regardless of attribute order.
#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct RowKey<'a>(Vec<(&'a str, KeyAtom<'a>)>);

impl<'a> RowKey<'a> {
    pub(crate) fn of(row: &'a Row) -> Self {
        let mut pairs: Vec<(&str, KeyAtom<'_>)> = row
            .iter()
            .map(|(name, value)| {
                let atom = match value {
                    Value::Bool(b) => KeyAtom::Bool(*b),
                    // -0.0 and 0.0 are the same number
                    Value::Number(n) if *n == 0.0 => KeyAtom::Number(0f64.to_bits()),
                    Value::Number(n) => KeyAtom::Number(n.to_bits()),
                    Value::String(s) => KeyAtom::String(s),
                };
                (name.as_str(), atom)
            })
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        RowKey(pairs)
    }
}

// ============ Relation lookup ============

/// Read-only access to named relations.
///
/// Implemented by whatever owns the datasets; the evaluator treats a `None`
/// as an empty relation.
pub trait RelationLookup {
    fn relation(&self, name: &str) -> Option<&Relation>;
}

impl<S: BuildHasher> RelationLookup for HashMap<String, Relation, S> {
    fn relation(&self, name: &str) -> Option<&Relation> {
        self.get(name)
    }
}

impl<S: BuildHasher> RelationLookup for IndexMap<String, Relation, S> {
    fn relation(&self, name: &str) -> Option<&Relation> {
        self.get(name)
    }
}

impl<T: RelationLookup + ?Sized> RelationLookup for &T {
    fn relation(&self, name: &str) -> Option<&Relation> {
        (**self).relation(name)
    }
}
