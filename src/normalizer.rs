//! Condition normalizer
//!
//! Compiles a [`Condition`] into a native selector fragment. The input tree is
//! only borrowed; every output value is an independent copy.

use crate::condition::{Condition, HashValue, Operand, Operator};
use crate::error::{Error, Result};
use crate::selector::{token, RawSelector, Selector};
use regex::Regex;
use serde_json::{json, Value};

/// Compile `condition` into a selector fragment.
///
/// `Empty` yields an empty fragment; the assembler decides what to send instead.
pub fn normalize(condition: &Condition) -> Result<Selector> {
    match condition {
        Condition::Empty => Ok(Selector::new()),
        Condition::Hash(pairs) => normalize_hash(pairs),
        Condition::Operator(op, operands) => normalize_operator(*op, operands),
        Condition::Raw(raw) => normalize_raw(raw),
    }
}

fn normalize_hash(pairs: &[(String, HashValue)]) -> Result<Selector> {
    let mut selector = Selector::new();
    for (name, value) in pairs {
        match value {
            HashValue::Literal(v) | HashValue::Native(v) => {
                selector.insert(name.as_str(), v.clone());
            }
            HashValue::List(values) => {
                selector.extend(membership(Operator::In, name, values.clone()));
            }
        }
    }
    Ok(selector)
}

fn normalize_operator(op: Operator, operands: &[Operand]) -> Result<Selector> {
    if let Some(arity) = op.arity() {
        if operands.len() != arity {
            return Err(Error::malformed(format!(
                "{} expects {} operands, got {}",
                op,
                arity,
                operands.len()
            )));
        }
    }

    match op {
        Operator::And | Operator::Or => {
            let fragments = operands
                .iter()
                .map(|o| normalize_operand(o).map(Selector::into_value))
                .collect::<Result<Vec<_>>>()?;
            Ok(Selector::single(op.native_token(), Value::Array(fragments)))
        }
        Operator::Between => {
            let column = column_name(op, &operands[0])?;
            let (lo, hi) = (value_of(op, &operands[1])?, value_of(op, &operands[2])?);
            Ok(Selector::single(column, json!({ token::GTE: lo, token::LTE: hi })))
        }
        // Both bounds land in one field map, which the store reads as a conjunction.
        Operator::NotBetween => {
            let column = column_name(op, &operands[0])?;
            let (lo, hi) = (value_of(op, &operands[1])?, value_of(op, &operands[2])?);
            Ok(Selector::single(column, json!({ token::LT: lo, token::GT: hi })))
        }
        Operator::In | Operator::NotIn => {
            let column = membership_column(op, &operands[0])?;
            let values = match value_of(op, &operands[1])? {
                Value::Array(values) => values,
                scalar => vec![scalar],
            };
            Ok(membership(op, &column, values))
        }
        Operator::Regex | Operator::Like => {
            let column = column_name(op, &operands[0])?;
            let pattern = match value_of(op, &operands[1])? {
                Value::String(p) => p,
                other => {
                    return Err(Error::malformed(format!(
                        "{} pattern must be a string, got {}",
                        op, other
                    )))
                }
            };
            // Narrower than the store's PCRE: no look-around, no backreferences.
            Regex::new(&pattern).map_err(|e| Error::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            Ok(Selector::single(column, json!({ token::REGEX: pattern })))
        }
    }
}

fn normalize_operand(operand: &Operand) -> Result<Selector> {
    match operand {
        Operand::Condition(c) => normalize(c),
        Operand::Value(v) => normalize(&Condition::from_value(v.clone())?),
    }
}

fn normalize_raw(raw: &RawSelector) -> Result<Selector> {
    let value = match raw {
        RawSelector::Structured(v) => v.clone(),
        RawSelector::Text(text) => serde_json::from_str(text)
            .map_err(|e| Error::malformed(format!("raw selector is not JSON: {}", e)))?,
    };
    match value {
        Value::Object(map) => Ok(map.into()),
        other => Err(Error::malformed(format!(
            "raw selector fragment must be an object, got {}",
            other
        ))),
    }
}

fn membership(op: Operator, column: &str, values: Vec<Value>) -> Selector {
    let mut inner = serde_json::Map::new();
    inner.insert(op.native_token(), Value::Array(values));
    Selector::single(column, Value::Object(inner))
}

fn membership_column(op: Operator, operand: &Operand) -> Result<String> {
    match operand {
        Operand::Value(Value::Array(columns)) => match columns.as_slice() {
            [] => Err(Error::malformed(format!("{} with an empty column list", op))),
            [single] => column_name(op, &Operand::Value(single.clone())),
            _ => Err(Error::UnsupportedCompositeKey(format!(
                "{} over columns {}",
                op,
                Value::Array(columns.clone())
            ))),
        },
        other => column_name(op, other),
    }
}

fn column_name(op: Operator, operand: &Operand) -> Result<String> {
    match operand {
        Operand::Value(Value::String(name)) if !name.is_empty() => Ok(name.clone()),
        other => Err(Error::malformed(format!(
            "{} expects a column name, got {:?}",
            op, other
        ))),
    }
}

fn value_of(op: Operator, operand: &Operand) -> Result<Value> {
    match operand {
        Operand::Value(v) => Ok(v.clone()),
        Operand::Condition(_) => Err(Error::malformed(format!(
            "{} expects a value operand, got a nested condition",
            op
        ))),
    }
}
