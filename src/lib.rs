//! couchfind
//!
//! Compiles abstract query conditions into the selector/sort/fields document of
//! a CouchDB-style `_find` endpoint, and runs them over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use couchfind::{Client, Condition, ConnectOptions, SortDirection};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> couchfind::Result<()> {
//!   let client = Client::connect(ConnectOptions::new("http://localhost:5984").with_auth("admin", "secret"))?;
//!
//!   let query = client
//!     .query("users")
//!     .filter(Condition::from_value(json!({"status": ["active", "trial"]}))?)
//!     .and_filter(Condition::between("age", 18, 65))
//!     .fields(["name", "email"])
//!     .order_by("name", SortDirection::Asc)
//!     .limit(25);
//!
//!   let found = client.find(&query).await?;
//!   for ident in found.identities(client.config())? {
//!     println!("{} @ {:?}", ident.id, ident.rev);
//!   }
//!
//!   Ok(())
//! }
//! ```

mod client;
pub mod condition;
mod config;
mod error;
pub mod normalizer;
pub mod protocol;
pub mod query;
pub mod selector;

pub use client::{Client, HttpTransport, Transport};
pub use condition::{Condition, HashValue, Operand, Operator};
pub use config::{CompilerConfig, ConnectOptions};
pub use error::{Error, Result};
pub use normalizer::normalize;
pub use protocol::{FindResponse, RecordIdentity};
pub use query::{database, CompiledQuery, Fields, QuerySpec, RequestOptions, SortDirection, SortSpec};
pub use selector::{RawSelector, Selector, SelectorDoc};
