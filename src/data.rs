use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

pub use crate::types::{AttrName, BowEntry, Vector};

/// A single attribute value carried by a [`Record`].
///
/// JSON input only ever produces `Null`, `Bool`, `Int`, `Float`, `Text`,
/// `List`, and `Map`. `Bow` and `Vector` are produced by pipes and serialize
/// as plain JSON arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered list, usually tokens or sentences.
    List(Vec<Value>),
    /// Nested attribute map.
    Map(Record),
    /// Sparse `(feature id, count)` pairs.
    Bow(Vec<BowEntry>),
    /// Dense numeric vector.
    Vector(Vector),
}

impl Value {
    /// Borrow the text payload, if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the list payload, if this is a `List` value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Borrow the bag-of-words payload, if this is a `Bow` value.
    pub fn as_bow(&self) -> Option<&[BowEntry]> {
        match self {
            Value::Bow(entries) => Some(entries),
            _ => None,
        }
    }

    /// Collect a list of text values into owned tokens.
    ///
    /// Returns `None` when the value is not a list or any element is not text.
    pub fn to_tokens(&self) -> Option<Vec<String>> {
        self.as_list()?
            .iter()
            .map(|value| value.as_text().map(str::to_string))
            .collect()
    }

    /// Numeric cast used by mean/threshold pipes.
    ///
    /// Integers, floats, and text that parses as a float are numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            Value::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Interpret the value as a dense numeric vector.
    ///
    /// Accepts `Vector` directly or a `List` whose elements are all numeric.
    pub fn to_vector(&self) -> Option<Vector> {
        match self {
            Value::Vector(values) => Some(values.clone()),
            Value::List(values) => values
                .iter()
                .map(|value| match value {
                    Value::Int(v) => Some(*v as f64),
                    Value::Float(v) => Some(*v),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Text rendering used for joins, grouping keys, and string casts.
    ///
    /// `Null` renders as the empty string; lists and maps render as JSON.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(text) => text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Map(value)
    }
}

/// Ordered, sparse attribute map flowing through pipes.
///
/// Accessors return `Option` so each pipe states explicitly whether an
/// absent attribute is tolerated. Equality ignores attribute order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attrs: IndexMap<AttrName, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(attr, value)` pairs, preserving their order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<AttrName>,
        V: Into<Value>,
    {
        pairs.into_iter().collect()
    }

    /// Builder-style insert.
    pub fn with(mut self, attr: impl Into<AttrName>, value: impl Into<Value>) -> Self {
        self.insert(attr, value);
        self
    }

    /// Borrow the value at `attr`.
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attrs.get(attr)
    }

    /// Mutably borrow the value at `attr`.
    pub fn get_mut(&mut self, attr: &str) -> Option<&mut Value> {
        self.attrs.get_mut(attr)
    }

    /// Borrow a text attribute; `None` when absent or not text.
    pub fn text(&self, attr: &str) -> Option<&str> {
        self.get(attr).and_then(Value::as_text)
    }

    /// True when `attr` is present.
    pub fn contains(&self, attr: &str) -> bool {
        self.attrs.contains_key(attr)
    }

    /// Insert or overwrite `attr`, returning the previous value.
    ///
    /// New attributes are appended; overwritten ones keep their position.
    pub fn insert(&mut self, attr: impl Into<AttrName>, value: impl Into<Value>) -> Option<Value> {
        self.attrs.insert(attr.into(), value.into())
    }

    /// Remove `attr` while preserving the order of remaining attributes.
    pub fn remove(&mut self, attr: &str) -> Option<Value> {
        self.attrs.shift_remove(attr)
    }

    /// Keep only attributes accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.attrs.retain(|attr, value| keep(attr, value));
    }

    /// Attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttrName, &Value)> {
        self.attrs.iter()
    }

    /// Attribute names in insertion order.
    pub fn attr_names(&self) -> impl Iterator<Item = &AttrName> {
        self.attrs.keys()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// True when the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Copy of this record with `attr` replaced by `value`.
    pub fn transformed(&self, attr: &str, value: impl Into<Value>) -> Self {
        let mut copy = self.clone();
        copy.insert(attr, value);
        copy
    }
}

impl<K: Into<AttrName>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            attrs: iter
                .into_iter()
                .map(|(attr, value)| (attr.into(), value.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (AttrName, Value);
    type IntoIter = indexmap::map::IntoIter<AttrName, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.into_iter()
    }
}

/// A finite, fully materialized sequence of records.
///
/// Two-pass aggregation pipes take and return this type so the point where
/// a lazy stream is forced into memory is visible in signatures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordBuffer {
    records: Vec<Record>,
}

impl RecordBuffer {
    /// Wrap already-collected records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Unwrap into the record vector.
    pub fn into_inner(self) -> Vec<Record> {
        self.records
    }
}

impl Deref for RecordBuffer {
    type Target = [Record];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl DerefMut for RecordBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.records
    }
}

impl From<Vec<Record>> for RecordBuffer {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for RecordBuffer {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordBuffer {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordBuffer {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
