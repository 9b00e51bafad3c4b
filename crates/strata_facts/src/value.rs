//! Defines the `Value` type for the fields of a fact.
//!
//! A `Value` is a ground scalar (symbol, string, number, boolean) or a
//! collection (list, map). Values are immutable and compare by content.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A ground value stored in a fact field.
///
/// Scalars cover the constants a rule set can mention; collections exist so
/// that aggregation results (`list`, `set`, `map`) are themselves first-class
/// values that later rules can take apart with the built-in virtual
/// predicates.
///
/// # Examples
///
/// ```
/// use strata_facts::Value;
///
/// let name = Value::symbol("walker");
/// assert_eq!(name.to_string(), "#walker");
///
/// let size = Value::integer(10);
/// assert_eq!(size.as_f64(), Some(10.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// An interned-style symbolic constant (written `#name`).
    Symbol(String),

    /// A UTF-8 string literal.
    String(String),

    /// A 64-bit signed integer.
    Integer(i64),

    /// A 64-bit floating-point number.
    Float(f64),

    /// A boolean.
    Boolean(bool),

    /// An ordered list of values; may contain duplicates.
    List(Vec<Value>),

    /// A map from values to values, preserving insertion order.
    Map(IndexMap<Value, Value>),
}

impl Value {
    /// Creates a symbolic constant. The leading `#` used by the surface
    /// syntax is not part of the stored name.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Creates a string literal.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Creates an integer value.
    pub fn integer(n: i64) -> Self {
        Self::Integer(n)
    }

    /// Creates a float value.
    pub fn float(f: f64) -> Self {
        Self::Float(f)
    }

    /// Creates a boolean value.
    pub fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Creates a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Creates a map value from key/value pairs, keeping first-seen key order.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::Map(entries.into_iter().collect())
    }

    /// Returns `true` for `Integer` and `Float` values.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// Returns `true` for `Symbol` and `String` values.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Symbol(_) | Self::String(_))
    }

    /// Returns `true` for `List` and `Map` values.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Returns the numeric value widened to `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the `i64` value if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the textual content of a `Symbol` or `String`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) | Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a `Map`.
    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Value equality with the optional symbol/string interop rule: when
    /// `interop` is set, a `Symbol` and a `String` are equal if their
    /// canonical names agree.
    pub fn matches(&self, other: &Value, interop: bool) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::String(b)) | (Self::String(a), Self::Symbol(b)) => {
                interop && a == b
            }
            _ => self == other,
        }
    }

    /// Compares two numeric values, widening integers to floats when the
    /// types differ. `None` when either side is not a number.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }

    /// Compares two textual values by their canonical names. `None` when
    /// either side is not text.
    pub fn text_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.as_text()?.cmp(other.as_text()?))
    }

    /// Returns a byte vector suitable for lexicographic ordering and
    /// consistent hashing across value variants.
    ///
    /// Each variant gets a distinct type tag; map entries are encoded in
    /// key-sorted order so that two equal maps built in different insertion
    /// orders produce the same key.
    pub fn sort_key(&self) -> Vec<u8> {
        match self {
            Self::Symbol(s) => {
                let mut key = vec![0u8];
                key.extend(s.as_bytes());
                key
            }
            Self::String(s) => {
                let mut key = vec![1u8];
                key.extend(s.as_bytes());
                key
            }
            Self::Integer(n) => {
                let mut key = vec![2u8];
                // Big-endian with the sign bit flipped sorts signed values correctly.
                key.extend(&((*n as u64) ^ (1u64 << 63)).to_be_bytes());
                key
            }
            Self::Float(f) => {
                let mut key = vec![3u8];
                let bits = f.to_bits();
                let sortable = if *f >= 0.0 { bits ^ (1u64 << 63) } else { !bits };
                key.extend(&sortable.to_be_bytes());
                key
            }
            Self::Boolean(b) => vec![4u8, u8::from(*b)],
            Self::List(items) => {
                let mut key = vec![5u8];
                for item in items {
                    let item_key = item.sort_key();
                    key.extend((item_key.len() as u32).to_be_bytes());
                    key.extend(item_key);
                }
                key
            }
            Self::Map(entries) => {
                let mut encoded: Vec<(Vec<u8>, Vec<u8>)> = entries
                    .iter()
                    .map(|(k, v)| (k.sort_key(), v.sort_key()))
                    .collect();
                encoded.sort();
                let mut key = vec![6u8];
                for (k, v) in encoded {
                    key.extend((k.len() as u32).to_be_bytes());
                    key.extend(k);
                    key.extend((v.len() as u32).to_be_bytes());
                    key.extend(v);
                }
                key
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, "#{}", s),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash via sort_key so equal values hash equally regardless of how
        // collections were built up.
        self.sort_key().hash(state);
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

// Convenient conversions from standard types into `Value`.
impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}
