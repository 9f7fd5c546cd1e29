//! Wire types returned by the store's `_find` endpoint.

use crate::config::CompilerConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path segment of the find endpoint under a database
pub const FIND_ENDPOINT: &str = "_find";

/// Successful `_find` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResponse {
  #[serde(default)]
  pub docs: Vec<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bookmark: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub warning: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_stats: Option<Value>,
}

/// Error body the store sends with non-success statuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String,
  #[serde(default)]
  pub reason: String,
}

/// Identity and concurrency token of one returned document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
  pub id: String,
  pub rev: Option<String>,
}

impl RecordIdentity {
  /// Read the primary key and revision out of a raw document.
  pub fn from_doc(doc: &Value, config: &CompilerConfig) -> Result<Self> {
    let id = match doc.get(&config.primary_key) {
      Some(Value::String(s)) => s.clone(),
      Some(other) => other.to_string(),
      None => {
        return Err(Error::Serialization(format!(
          "document has no {} field",
          config.primary_key
        )))
      }
    };
    let rev = doc
      .get(&config.revision_field)
      .and_then(Value::as_str)
      .map(str::to_string);
    Ok(Self { id, rev })
  }
}

impl FindResponse {
  /// Identities of every returned document, in result order.
  pub fn identities(&self, config: &CompilerConfig) -> Result<Vec<RecordIdentity>> {
    self
      .docs
      .iter()
      .map(|d| RecordIdentity::from_doc(d, config))
      .collect()
  }

  /// Deserialize every document into `T`.
  pub fn records<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>> {
    self
      .docs
      .iter()
      .map(|d| serde_json::from_value(d.clone()).map_err(Error::from))
      .collect()
  }
}
