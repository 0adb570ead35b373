//! Converted Value Types
//!
//! An element converts to one of three shapes: a scalar (text or nothing),
//! an ordered mapping, or an ordered list.

use std::fmt;

use indexmap::IndexMap;

/// Ordered mapping produced for elements with attributes or distinct children
pub type Mapping = IndexMap<String, Value>;

/// Structured value produced from an element
///
/// Equality on `Mapping` ignores key order, as for any map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Value {
    /// Trimmed text, or `None` for an empty element
    Scalar(Option<String>),
    /// Attribute and child entries keyed by name
    Mapping(Mapping),
    /// Converted members of a repeated tag
    List(Vec<Value>),
}

impl Value {
    /// Create a null scalar
    pub fn null() -> Self {
        Value::Scalar(None)
    }

    /// Create a text scalar
    pub fn text(s: impl Into<String>) -> Self {
        Value::Scalar(Some(s.into()))
    }

    /// Check if this is a null scalar
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(None))
    }

    /// Get scalar text, or None
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => s.as_deref(),
            _ => None,
        }
    }

    /// Get as mapping, or None
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Get as list, or None
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Look up an index when this value is a list
    pub fn index(&self, i: usize) -> Option<&Value> {
        self.as_list().and_then(|items| items.get(i))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(None)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Some(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Some(s))
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        Value::Scalar(s)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Compact diagnostic rendering, keys in insertion order.
///
/// Strings are quoted as by `Debug`; use the `serde` feature for JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(None) => f.write_str("null"),
            Value::Scalar(Some(s)) => write!(f, "{:?}", s),
            Value::Mapping(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(None) => serializer.serialize_none(),
            Value::Scalar(Some(s)) => serializer.serialize_str(s),
            Value::Mapping(map) => map.serialize(serializer),
            Value::List(items) => items.serialize(serializer),
        }
    }
}
