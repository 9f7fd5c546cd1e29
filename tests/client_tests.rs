//! Client tests for couchfind.

use couchfind::{
  Client, CompiledQuery, Condition, ConnectOptions, Error, FindResponse, SortDirection, Transport,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

/// Records every body it is asked to send and answers with canned docs.
struct StubTransport {
  sent: Mutex<Vec<(String, Value)>>,
  docs: Vec<Value>,
}

impl StubTransport {
  fn new(docs: Vec<Value>) -> Self {
    Self {
      sent: Mutex::new(Vec::new()),
      docs,
    }
  }
}

impl Transport for StubTransport {
  fn find<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, couchfind::Result<FindResponse>> {
    async move {
      let body = query.to_body()?;
      self
        .sent
        .lock()
        .unwrap()
        .push((query.database().to_string(), body));
      Ok(FindResponse {
        docs: self.docs.clone(),
        ..FindResponse::default()
      })
    }
    .boxed()
  }
}

#[test]
fn test_connect_options_default() {
  let opts = ConnectOptions::default();
  assert_eq!(opts.base_url, "http://localhost:5984");
  assert!(opts.username.is_none());
  assert!(opts.timeout.is_none());
}

#[test]
fn test_connect_options_builder_chain() {
  let opts = ConnectOptions::new("http://db.example.com:5984")
    .with_auth("admin", "secret")
    .with_timeout(Duration::from_secs(5));

  assert_eq!(opts.base_url, "http://db.example.com:5984");
  assert_eq!(opts.username, Some("admin".to_string()));
  assert_eq!(opts.password, Some("secret".to_string()));
  assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_error_display() {
  let err = Error::MalformedCondition("BETWEEN expects 3 operands, got 2".to_string());
  assert_eq!(
    format!("{}", err),
    "Malformed condition: BETWEEN expects 3 operands, got 2"
  );

  let err = Error::Http {
    status: 404,
    reason: "not_found".to_string(),
  };
  assert_eq!(format!("{}", err), "HTTP 404: not_found");

  let err = Error::Timeout;
  assert_eq!(format!("{}", err), "Timeout");
  assert!(!err.is_compile_error());
}

#[test]
fn test_error_from_json() {
  let json_err = serde_json::from_str::<Value>("invalid").unwrap_err();
  let err: Error = json_err.into();
  match err {
    Error::Serialization(_) => {}
    _ => panic!("Expected Serialization error"),
  }
}

#[tokio::test]
async fn test_find_sends_compiled_body() {
  let client = Client::with_transport(StubTransport::new(vec![json!({"_id": "a", "_rev": "1-x"})]));
  let query = client
    .query("users")
    .filter(Condition::hash([("active", json!(true))]))
    .order_by("name", SortDirection::Asc);

  let found = client.find(&query).await.unwrap();
  assert_eq!(found.docs.len(), 1);

  let sent = client.transport().sent.lock().unwrap();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].0, "users");
  assert_eq!(
    sent[0].1,
    json!({
      "selector": {"active": true, "name": {"$gt": null}},
      "sort": [{"name": "asc"}]
    })
  );
}

#[tokio::test]
async fn test_compile_error_never_reaches_transport() {
  let client = Client::with_transport(StubTransport::new(vec![]));
  let query = client.query("users").filter(Condition::regex("name", "[oops"));

  let err = client.find(&query).await.unwrap_err();
  assert!(err.is_compile_error());
  assert!(client.transport().sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_find_records_deserializes_docs() {
  #[derive(Deserialize)]
  struct User {
    #[serde(rename = "_id")]
    id: String,
    name: String,
  }

  let client = Client::with_transport(StubTransport::new(vec![
    json!({"_id": "u1", "_rev": "1-a", "name": "Alice"}),
    json!({"_id": "u2", "_rev": "3-b", "name": "Bob"}),
  ]));
  let users: Vec<User> = client
    .find_records(&client.query("users").fields(["name"]))
    .await
    .unwrap();
  assert_eq!(users.len(), 2);
  assert_eq!(users[0].id, "u1");
  assert_eq!(users[1].name, "Bob");

  let sent = client.transport().sent.lock().unwrap();
  assert_eq!(sent[0].1["fields"], json!(["_id", "_rev", "name"]));
}

#[tokio::test]
async fn test_connect_refused() {
  let client = Client::connect(
    ConnectOptions::new("http://127.0.0.1:59999").with_timeout(Duration::from_secs(5)),
  )
  .unwrap();
  let result = client.find(&client.query("users")).await;

  match result.unwrap_err() {
    Error::Connection(_) | Error::Timeout => {}
    e => panic!("Expected Connection or Timeout error, got: {:?}", e),
  }
}
