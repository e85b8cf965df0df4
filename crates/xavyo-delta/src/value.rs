//! Value model.
//!
//! A [`Value`] is one value of a (possibly multi-valued) item. It is always
//! read from or written to an item addressed by an [`ItemPath`](crate::ItemPath).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalize a string the way polystring `norm` values are computed:
/// trimmed, inner whitespace collapsed to a single space, lowercased.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A string kept together with its normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolyString {
    /// The original, user-visible value.
    pub orig: String,
    /// The normalized value used for matching.
    pub norm: String,
}

impl PolyString {
    /// Create a polystring, computing its normalized form.
    pub fn new(orig: impl Into<String>) -> Self {
        let orig = orig.into();
        let norm = normalize_text(&orig);
        Self { orig, norm }
    }
}

impl fmt::Display for PolyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.orig)
    }
}

/// A reference to another object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Target object identifier.
    pub oid: Uuid,
    /// Target object type (e.g. "focus", "shadow", "resource").
    #[serde(rename = "type")]
    pub object_type: String,
}

impl ObjectRef {
    pub fn new(oid: Uuid, object_type: impl Into<String>) -> Self {
        Self {
            oid,
            object_type: object_type.into(),
        }
    }
}

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    String,
    PolyString,
    Reference,
    Structured,
    Timestamp,
}

impl ValueKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::String => "string",
            ValueKind::PolyString => "poly_string",
            ValueKind::Reference => "reference",
            ValueKind::Structured => "structured",
            ValueKind::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed scalar, reference, or structured value.
///
/// Serialized untagged so configuration can use plain JSON literals.
/// Timestamps serialize as RFC 3339 strings and deserialize back as
/// [`Value::String`]; typed coercion restores them where a timestamp is
/// expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    PolyString(PolyString),
    Reference(ObjectRef),
    /// Container value: named sub-items, each multi-valued.
    Structured(BTreeMap<String, Vec<Value>>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::String(_) => ValueKind::String,
            Value::PolyString(_) => ValueKind::PolyString,
            Value::Reference(_) => ValueKind::Reference,
            Value::Structured(_) => ValueKind::Structured,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Textual content of string-like values (the `orig` part of a polystring).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::PolyString(p) => Some(&p.orig),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<&ObjectRef> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_structured(&self) -> Option<&BTreeMap<String, Vec<Value>>> {
        match self {
            Value::Structured(map) => Some(map),
            _ => None,
        }
    }

    /// Order two values of comparable kinds.
    ///
    /// String and polystring compare by their textual content. Returns `None`
    /// for kinds without an order (references, structured values) or when the
    /// kinds differ.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::PolyString(a), Value::PolyString(b)) => Some(a.orig.cmp(&b.orig)),
            (a, b) => match (a.as_str(), b.as_str()) {
                (Some(a), Some(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }
}

/// Descend into structured values along `segments`.
///
/// Values that are not structured, and structured values without the next
/// sub-item, contribute nothing.
#[must_use]
pub fn descend(values: &[Value], segments: &[String]) -> Vec<Value> {
    let mut current = values.to_vec();
    for segment in segments {
        if current.is_empty() {
            break;
        }
        current = current
            .iter()
            .filter_map(Value::as_structured)
            .filter_map(|map| map.get(segment))
            .flatten()
            .cloned()
            .collect();
    }
    current
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s}"),
            Value::PolyString(p) => write!(f, "{p}"),
            Value::Reference(r) => write!(f, "{}:{}", r.object_type, r.oid),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Structured(map) => {
                write!(f, "{{")?;
                for (i, (key, values)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                    write!(f, "{key}: [{}]", rendered.join(", "))?;
                }
                write!(f, "}}")
            }
        }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<PolyString> for Value {
    fn from(p: PolyString) -> Self {
        Value::PolyString(p)
    }
}

impl From<ObjectRef> for Value {
    fn from(r: ObjectRef) -> Self {
        Value::Reference(r)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polystring_normalization() {
        let p = PolyString::new("  Jack   SPARROW ");
        assert_eq!(p.orig, "  Jack   SPARROW ");
        assert_eq!(p.norm, "jack sparrow");
    }

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(Value::from(1).compare(&Value::from(2)), Some(Ordering::Less));
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::from("abc").compare(&Value::from(PolyString::new("abc"))),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_incomparable_kinds() {
        assert_eq!(Value::from(1).compare(&Value::from("1")), None);
        let reference = Value::from(ObjectRef::new(Uuid::new_v4(), "focus"));
        assert_eq!(reference.compare(&reference), None);
    }

    #[test]
    fn test_untagged_json_literals() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[true, 42, "text", {"orig": "A", "norm": "a"}]"#).unwrap();
        assert_eq!(values[0], Value::Bool(true));
        assert_eq!(values[1], Value::Int(42));
        assert_eq!(values[2], Value::from("text"));
        assert_eq!(values[3].kind(), ValueKind::PolyString);
    }

    #[test]
    fn test_descend_skips_non_structured() {
        let mut inner = BTreeMap::new();
        inner.insert("city".to_string(), vec![Value::from("Tortuga")]);
        let values = vec![Value::Structured(inner), Value::from("flat")];
        let found = descend(&values, &["city".to_string()]);
        assert_eq!(found, vec![Value::from("Tortuga")]);
        assert!(descend(&values, &["zip".to_string()]).is_empty());
    }

    #[test]
    fn test_structured_display() {
        let mut map = BTreeMap::new();
        map.insert("mail".to_string(), vec![Value::from("a@example.com")]);
        let value = Value::Structured(map);
        assert_eq!(value.to_string(), "{mail: [a@example.com]}");
        assert!(value.as_structured().is_some());
    }
}
