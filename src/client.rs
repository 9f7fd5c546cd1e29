//! Transport boundary and the HTTP client that executes compiled queries.

use crate::config::{CompilerConfig, ConnectOptions};
use crate::error::{Error, Result};
use crate::protocol::{ErrorBody, FindResponse, FIND_ENDPOINT};
use crate::query::{CompiledQuery, QuerySpec};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;

/// Executes compiled queries against a store.
pub trait Transport: Send + Sync {
  fn find<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<FindResponse>>;
}

/// Single-node HTTP transport. No pooling policy, node selection or retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  http: reqwest::Client,
  options: ConnectOptions,
}

impl HttpTransport {
  pub fn new(options: ConnectOptions) -> Result<Self> {
    let http = reqwest::Client::builder().build()?;
    Ok(Self { http, options })
  }

  pub fn find_url(&self, database: &str) -> String {
    format!(
      "{}/{}/{}",
      self.options.base_url,
      urlencoding::encode(database),
      FIND_ENDPOINT
    )
  }

  async fn send(&self, query: &CompiledQuery) -> Result<FindResponse> {
    // Built before any I/O so a bad raw selector never reaches the wire.
    let body = query.to_body()?;
    let url = self.find_url(query.database());
    log::debug!("POST {}", url);

    let mut req = self.http.post(&url).json(&body);
    if let Some(user) = &self.options.username {
      req = req.basic_auth(user, self.options.password.as_deref());
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      let reason = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if body.reason.is_empty() => body.error,
        Ok(body) => format!("{}: {}", body.error, body.reason),
        Err(_) => text,
      };
      log::warn!("find on {} failed with {}: {}", query.database(), status, reason);
      return Err(Error::Http {
        status: status.as_u16(),
        reason,
      });
    }

    Ok(resp.json::<FindResponse>().await?)
  }
}

impl Transport for HttpTransport {
  fn find<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<FindResponse>> {
    let timeout = query.options().timeout.or(self.options.timeout);
    async move {
      match timeout {
        Some(limit) => tokio::time::timeout(limit, self.send(query))
          .await
          .map_err(|_| Error::Timeout)?,
        None => self.send(query).await,
      }
    }
    .boxed()
  }
}

/// Compiles queries and hands them to a [`Transport`].
pub struct Client<T: Transport = HttpTransport> {
  transport: T,
  config: CompilerConfig,
}

impl Client<HttpTransport> {
  pub fn connect(options: ConnectOptions) -> Result<Self> {
    Ok(Self::with_transport(HttpTransport::new(options)?))
  }
}

impl<T: Transport> Client<T> {
  pub fn with_transport(transport: T) -> Self {
    Self {
      transport,
      config: CompilerConfig::default(),
    }
  }

  pub fn with_config(mut self, config: CompilerConfig) -> Self {
    self.config = config;
    self
  }

  pub fn config(&self) -> &CompilerConfig {
    &self.config
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Start a query that compiles with this client's field configuration.
  pub fn query(&self, database: impl Into<String>) -> QuerySpec {
    QuerySpec::database(database).config(self.config.clone())
  }

  /// Compile `spec` and run it. Compile errors return before the transport is touched.
  pub async fn find(&self, spec: &QuerySpec) -> Result<FindResponse> {
    let compiled = spec.assemble()?;
    self.transport.find(&compiled).await
  }

  pub async fn find_records<R: DeserializeOwned>(&self, spec: &QuerySpec) -> Result<Vec<R>> {
    self.find(spec).await?.records()
  }
}
