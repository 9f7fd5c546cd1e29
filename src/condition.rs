//! Condition expressions
//!
//! A [`Condition`] is the abstract `where` of a query. It can be built with the
//! fluent helpers or parsed from the loose JSON shorthand:
//!
//! ```
//! use couchfind::{normalize, Condition};
//! use serde_json::json;
//!
//! let parsed = Condition::from_value(json!(["AND", {"type": "user"}, ["BETWEEN", "age", 18, 65]])).unwrap();
//! let built = Condition::and(vec![
//!     Condition::hash([("type", json!("user"))]),
//!     Condition::between("age", 18, 65),
//! ]);
//! assert_eq!(normalize(&parsed).unwrap(), normalize(&built).unwrap());
//! ```

use crate::error::{Error, Result};
use crate::selector::{token, RawSelector};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Supported condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Between,
    NotBetween,
    In,
    NotIn,
    Regex,
    Like,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Regex => "REGEX",
            Operator::Like => "LIKE",
        }
    }

    /// Native token for this operator, falling back to the lower-cased name.
    pub fn native_token(&self) -> String {
        match self {
            Operator::And => token::AND.to_string(),
            Operator::Or => token::OR.to_string(),
            Operator::In => token::IN.to_string(),
            Operator::NotIn => token::NOT_IN.to_string(),
            other => other.as_str().to_lowercase(),
        }
    }

    /// Number of operands the operator takes, `None` when variadic.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Operator::And | Operator::Or => None,
            Operator::Between | Operator::NotBetween => Some(3),
            Operator::In | Operator::NotIn | Operator::Regex | Operator::Like => Some(2),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match name.as_str() {
            "AND" => Ok(Operator::And),
            "OR" => Ok(Operator::Or),
            "BETWEEN" => Ok(Operator::Between),
            "NOT BETWEEN" => Ok(Operator::NotBetween),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "REGEX" => Ok(Operator::Regex),
            "LIKE" => Ok(Operator::Like),
            _ => Err(Error::malformed(format!("unknown operator {:?}", s))),
        }
    }
}

/// Value side of a hash condition pair
#[derive(Debug, Clone, PartialEq)]
pub enum HashValue {
    /// Compared by equality.
    Literal(Value),
    /// Membership shorthand, compiled as `IN`.
    List(Vec<Value>),
    /// Already in native selector form; passed through unchanged.
    Native(Value),
}

impl HashValue {
    /// Classify a value found under `key` in the JSON shorthand.
    pub fn classify(key: &str, value: Value) -> Self {
        if key.starts_with(token::SIGIL) {
            return HashValue::Native(value);
        }
        match value {
            Value::Array(items) => HashValue::List(items),
            Value::Object(_) => HashValue::Native(value),
            other => HashValue::Literal(other),
        }
    }
}

/// Operator argument
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Condition(Condition),
    Value(Value),
}

impl From<Condition> for Operand {
    fn from(c: Condition) -> Self {
        Operand::Condition(c)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Value(Value::String(s.to_string()))
    }
}

/// Abstract query condition
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    /// No condition.
    #[default]
    Empty,
    /// Field → value pairs. Duplicate fields collapse with the last pair winning.
    Hash(Vec<(String, HashValue)>),
    Operator(Operator, Vec<Operand>),
    /// Opaque selector fragment, never inspected.
    Raw(RawSelector),
}

impl Condition {
    /// Parse the loose JSON shorthand.
    ///
    /// `null`, `[]` and `{}` are empty; a string is a raw selector; an object is a
    /// hash; an array led by a string is an operator form.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Condition::Empty),
            Value::String(text) => Ok(Condition::Raw(RawSelector::Text(text))),
            Value::Object(map) if map.is_empty() => Ok(Condition::Empty),
            Value::Object(map) => Ok(Condition::Hash(
                map.into_iter()
                    .map(|(k, v)| {
                        let hv = HashValue::classify(&k, v);
                        (k, hv)
                    })
                    .collect(),
            )),
            Value::Array(items) if items.is_empty() => Ok(Condition::Empty),
            Value::Array(items) => {
                let mut items = items.into_iter();
                let op = match items.next() {
                    Some(Value::String(name)) => name.parse::<Operator>()?,
                    Some(other) => {
                        return Err(Error::malformed(format!(
                            "operator name must be a string, got {}",
                            other
                        )))
                    }
                    None => return Ok(Condition::Empty),
                };
                Ok(Condition::Operator(op, items.map(Operand::Value).collect()))
            }
            other => Err(Error::malformed(format!("unsupported condition {}", other))),
        }
    }

    /// True for `Empty` and for a hash with no pairs.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Empty => true,
            Condition::Hash(pairs) => pairs.is_empty(),
            _ => false,
        }
    }

    pub fn hash<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Condition::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| {
                    let k: String = k.into();
                    let hv = HashValue::classify(&k, v);
                    (k, hv)
                })
                .collect(),
        )
    }

    pub fn raw(raw: impl Into<RawSelector>) -> Self {
        Condition::Raw(raw.into())
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::Operator(Operator::And, conditions.into_iter().map(Operand::from).collect())
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Operator(Operator::Or, conditions.into_iter().map(Operand::from).collect())
    }

    pub fn between(column: &str, lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Self::ranged(Operator::Between, column, lo.into(), hi.into())
    }

    pub fn not_between(column: &str, lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Self::ranged(Operator::NotBetween, column, lo.into(), hi.into())
    }

    pub fn is_in(column: &str, values: Vec<Value>) -> Self {
        Condition::Operator(Operator::In, vec![column.into(), Value::Array(values).into()])
    }

    pub fn not_in(column: &str, values: Vec<Value>) -> Self {
        Condition::Operator(Operator::NotIn, vec![column.into(), Value::Array(values).into()])
    }

    /// Match `column` against `pattern`.
    ///
    /// Patterns are checked with the `regex` crate's syntax before anything is
    /// sent. That dialect has no look-around or backreferences, so such patterns
    /// fail with [`Error::InvalidPattern`] even where the store would accept them.
    pub fn regex(column: &str, pattern: &str) -> Self {
        Condition::Operator(Operator::Regex, vec![column.into(), pattern.into()])
    }

    /// Same as [`Condition::regex`], dialect limits included; the pattern is a
    /// regular expression, not SQL wildcards.
    pub fn like(column: &str, pattern: &str) -> Self {
        Condition::Operator(Operator::Like, vec![column.into(), pattern.into()])
    }

    fn ranged(op: Operator, column: &str, lo: Value, hi: Value) -> Self {
        Condition::Operator(op, vec![column.into(), lo.into(), hi.into()])
    }
}

impl TryFrom<Value> for Condition {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Condition::from_value(value)
    }
}
