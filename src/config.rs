//! Compiler and connection configuration.

use std::time::Duration;

/// Field names the record-mapping layer relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
  pub primary_key: String,
  pub revision_field: String,
}

impl Default for CompilerConfig {
  fn default() -> Self {
    Self {
      primary_key: "_id".to_string(),
      revision_field: "_rev".to_string(),
    }
  }
}

impl CompilerConfig {
  pub fn new(primary_key: impl Into<String>, revision_field: impl Into<String>) -> Self {
    Self {
      primary_key: primary_key.into(),
      revision_field: revision_field.into(),
    }
  }
}

/// Options for reaching a single store node over HTTP.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
  pub base_url: String,
  pub username: Option<String>,
  pub password: Option<String>,
  pub timeout: Option<Duration>,
}

impl ConnectOptions {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      username: None,
      password: None,
      timeout: None,
    }
  }

  pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
    self.username = Some(username.into());
    self.password = Some(password.into());
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

impl Default for ConnectOptions {
  fn default() -> Self {
    Self::new("http://localhost:5984")
  }
}
