//! Selector documents as sent to the store's `_find` endpoint.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// Native operator tokens understood by the store.
pub mod token {
    pub const AND: &str = "$and";
    pub const OR: &str = "$or";
    pub const IN: &str = "$in";
    pub const NOT_IN: &str = "$nin";
    pub const GT: &str = "$gt";
    pub const GTE: &str = "$gte";
    pub const LT: &str = "$lt";
    pub const LTE: &str = "$lte";
    pub const REGEX: &str = "$regex";

    /// Prefix reserved for native operator keys.
    pub const SIGIL: char = '$';
}

/// Permissive constraint satisfied by every real value: `{"$gt": null}`.
///
/// `null` sorts lowest in the store's collation, so any present field passes.
pub fn existence_constraint() -> Value {
    json!({ token::GT: Value::Null })
}

/// Ordered selector fragment.
///
/// Keys keep their first insertion position. Inserting a key that is already
/// present replaces its value (last write wins); callers that merge fragments
/// with overlapping keys get the later value, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Selector(Map<String, Value>);

impl Selector {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Insert `key → value`, replacing any earlier value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Merge every entry of `other` into `self` with last-write-wins semantics.
    pub fn extend(&mut self, other: Selector) {
        for (k, v) in other.0 {
            self.0.insert(k, v);
        }
    }

    pub fn single(key: impl Into<String>, value: Value) -> Self {
        let mut s = Self::new();
        s.insert(key, value);
        s
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Selector {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Selector> for Value {
    fn from(s: Selector) -> Self {
        s.into_value()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// A caller-supplied selector carried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSelector {
    /// JSON text, embedded as-is into the request body.
    Text(String),
    Structured(Value),
}

impl From<&str> for RawSelector {
    fn from(s: &str) -> Self {
        RawSelector::Text(s.to_string())
    }
}

impl From<String> for RawSelector {
    fn from(s: String) -> Self {
        RawSelector::Text(s)
    }
}

impl From<Value> for RawSelector {
    fn from(v: Value) -> Self {
        RawSelector::Structured(v)
    }
}

/// The selector of a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorDoc {
    Structured(Selector),
    /// Raw structured value that is not a plain object fragment.
    Other(Value),
    Text(String),
}

impl SelectorDoc {
    /// AND the raw selector with a compiled fragment.
    ///
    /// Text selectors are wrapped textually; structured ones as `{"$and": [raw, compiled]}`.
    pub fn and_raw(raw: RawSelector, compiled: Selector) -> Self {
        match raw {
            RawSelector::Text(text) => SelectorDoc::Text(format!(
                r#"{{"{}":[{},{}]}}"#,
                token::AND,
                text,
                compiled
            )),
            RawSelector::Structured(value) => SelectorDoc::Structured(Selector::single(
                token::AND,
                Value::Array(vec![value, compiled.into_value()]),
            )),
        }
    }

    pub fn from_raw(raw: RawSelector) -> Self {
        match raw {
            RawSelector::Text(text) => SelectorDoc::Text(text),
            RawSelector::Structured(Value::Object(map)) => SelectorDoc::Structured(map.into()),
            RawSelector::Structured(value) => SelectorDoc::Other(value),
        }
    }

    /// Whether `field` is already a top-level key of this selector.
    ///
    /// Text selectors are opaque and never report a key.
    pub fn constrains(&self, field: &str) -> bool {
        match self {
            SelectorDoc::Structured(s) => s.contains_key(field),
            SelectorDoc::Other(Value::Object(map)) => map.contains_key(field),
            _ => false,
        }
    }

    /// Add top-level constraints, keeping every existing key untouched.
    pub fn with_constraints(self, extra: Selector) -> Self {
        if extra.is_empty() {
            return self;
        }
        match self {
            SelectorDoc::Structured(mut s) => {
                for (k, v) in extra.into_map() {
                    if !s.contains_key(&k) {
                        s.insert(k, v);
                    }
                }
                SelectorDoc::Structured(s)
            }
            SelectorDoc::Other(Value::Object(map)) => {
                SelectorDoc::Structured(Selector::from(map)).with_constraints(extra)
            }
            SelectorDoc::Other(value) => SelectorDoc::Structured(Selector::single(
                token::AND,
                Value::Array(vec![value, extra.into_value()]),
            )),
            SelectorDoc::Text(text) => SelectorDoc::and_raw(RawSelector::Text(text), extra),
        }
    }

    /// Structured view, or `None` for text selectors.
    pub fn as_selector(&self) -> Option<&Selector> {
        match self {
            SelectorDoc::Structured(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            SelectorDoc::Structured(s) => Ok(s.clone().into_value()),
            SelectorDoc::Other(v) => Ok(v.clone()),
            SelectorDoc::Text(text) => serde_json::from_str(text),
        }
    }
}

impl Serialize for SelectorDoc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SelectorDoc::Structured(s) => s.serialize(serializer),
            SelectorDoc::Other(v) => v.serialize(serializer),
            SelectorDoc::Text(text) => {
                let value: Value = serde_json::from_str(text).map_err(serde::ser::Error::custom)?;
                value.serialize(serializer)
            }
        }
    }
}
