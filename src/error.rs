//! Error types for the couchfind client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Malformed condition: {0}")]
  MalformedCondition(String),

  #[error("Composite key not supported: {0}")]
  UnsupportedCompositeKey(String),

  #[error("Invalid pattern {pattern:?}: {reason}")]
  InvalidPattern { pattern: String, reason: String },

  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("Connection error: {0}")]
  Connection(String),

  #[error("HTTP {status}: {reason}")]
  Http { status: u16, reason: String },

  #[error("Timeout")]
  Timeout,
}

impl Error {
  /// True for errors raised while compiling a query, before anything reaches the wire.
  pub fn is_compile_error(&self) -> bool {
    matches!(
      self,
      Self::MalformedCondition(_) | Self::UnsupportedCompositeKey(_) | Self::InvalidPattern { .. }
    )
  }

  pub(crate) fn malformed(msg: impl Into<String>) -> Self {
    Self::MalformedCondition(msg.into())
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

impl From<reqwest::Error> for Error {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      Self::Timeout
    } else if let Some(status) = e.status() {
      Self::Http {
        status: status.as_u16(),
        reason: e.to_string(),
      }
    } else {
      Self::Connection(e.to_string())
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
