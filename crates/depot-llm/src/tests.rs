use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  extract::State,
  http::{HeaderMap, StatusCode},
  routing::post,
};
use depot_core::{
  chat::ChatTurn,
  llm::{Completer, CompletionRequest, Embedder, EmbeddingRole},
};
use serde_json::{Value, json};

use crate::{Error, LlmClient, LlmConfig};

#[derive(Clone, Default)]
struct Recorded {
  calls: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Recorded {
  fn push(&self, headers: &HeaderMap, body: Value) {
    let auth = headers
      .get("authorization")
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    self.calls.lock().unwrap().push((auth, body));
  }

  fn take(&self) -> Vec<(Option<String>, Value)> {
    std::mem::take(&mut *self.calls.lock().unwrap())
  }
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{addr}")
}

fn client(base_url: String) -> LlmClient {
  let mut config = LlmConfig::new("secret-key", "folder-1");
  config.base_url = base_url;
  config.timeout_secs = Some(5);
  LlmClient::new(config).unwrap()
}

fn provider(recorded: Recorded, completion: Value) -> Router {
  Router::new()
    .route(
      "/foundationModels/v1/textEmbedding",
      post(
        |State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
          rec.push(&headers, body);
          Json(json!({ "embedding": [0.5, -0.25, 1.0], "numTokens": "3" }))
        },
      ),
    )
    .route(
      "/foundationModels/v1/completion",
      post(
        move |State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| {
          let completion = completion.clone();
          async move {
            rec.push(&headers, body);
            Json(completion)
          }
        },
      ),
    )
    .with_state(recorded)
}

fn answer(text: &str) -> Value {
  json!({
    "result": {
      "alternatives": [
        { "message": { "role": "assistant", "text": text }, "status": "ALTERNATIVE_STATUS_FINAL" }
      ],
      "modelVersion": "test"
    }
  })
}

#[test]
fn model_uris_follow_folder() {
  let config = LlmConfig::new("k", "b1g");
  assert_eq!(
    config.embedding_model_uri(EmbeddingRole::Query),
    "emb://b1g/text-search-query/latest"
  );
  assert_eq!(
    config.embedding_model_uri(EmbeddingRole::Document),
    "emb://b1g/text-search-doc/latest"
  );
  assert_eq!(config.completion_model_uri(), "gpt://b1g/yandexgpt-lite/latest");
}

#[test]
fn missing_credentials_are_rejected() {
  assert!(matches!(
    LlmClient::new(LlmConfig::new("", "folder")),
    Err(Error::Config("api_key"))
  ));
  assert!(matches!(
    LlmClient::new(LlmConfig::new("key", "")),
    Err(Error::Config("folder_id"))
  ));
}

#[tokio::test]
async fn embed_sends_model_uri_and_api_key() {
  let recorded = Recorded::default();
  let base = spawn(provider(recorded.clone(), answer("unused"))).await;
  let llm = client(base);

  let vector = llm.embed("как вернуть товар", EmbeddingRole::Query).await.unwrap();
  assert_eq!(vector, vec![0.5, -0.25, 1.0]);

  llm.embed("статья", EmbeddingRole::Document).await.unwrap();

  let calls = recorded.take();
  assert_eq!(calls.len(), 2);
  assert_eq!(calls[0].0.as_deref(), Some("Api-Key secret-key"));
  assert_eq!(
    calls[0].1,
    json!({ "modelUri": "emb://folder-1/text-search-query/latest", "text": "как вернуть товар" })
  );
  assert_eq!(calls[1].1["modelUri"], "emb://folder-1/text-search-doc/latest");
}

#[tokio::test]
async fn complete_sends_system_then_turns() {
  let recorded = Recorded::default();
  let base = spawn(provider(recorded.clone(), answer("Ответ"))).await;
  let llm = client(base);

  let request = CompletionRequest {
    system: "instructions".into(),
    turns:  vec![
      ChatTurn::user("привет"),
      ChatTurn::assistant("здравствуйте"),
      ChatTurn::user("сколько стоит упаковка?"),
    ],
  };
  let reply = llm.complete(&request).await.unwrap();
  assert_eq!(reply, "Ответ");

  let calls = recorded.take();
  assert_eq!(calls.len(), 1);
  let body = &calls[0].1;
  assert_eq!(body["modelUri"], "gpt://folder-1/yandexgpt-lite/latest");
  assert_eq!(body["completionOptions"]["stream"], false);
  assert_eq!(body["completionOptions"]["maxTokens"], 2000);
  let temperature = body["completionOptions"]["temperature"].as_f64().unwrap();
  assert!((temperature - 0.3).abs() < 1e-6);

  let roles: Vec<&str> = body["messages"]
    .as_array()
    .unwrap()
    .iter()
    .map(|m| m["role"].as_str().unwrap())
    .collect();
  assert_eq!(roles, ["system", "user", "assistant", "user"]);
  assert_eq!(body["messages"][0]["text"], "instructions");
  assert_eq!(body["messages"][3]["text"], "сколько стоит упаковка?");
}

#[tokio::test]
async fn empty_alternatives_is_an_error() {
  let base = spawn(provider(
    Recorded::default(),
    json!({ "result": { "alternatives": [] } }),
  ))
  .await;
  let llm = client(base);

  let request = CompletionRequest { system: "s".into(), turns: vec![ChatTurn::user("q")] };
  let err = llm.complete(&request).await.unwrap_err();
  assert!(matches!(err, Error::NoAlternatives));
}

#[tokio::test]
async fn non_success_status_carries_body() {
  let router = Router::new().route(
    "/foundationModels/v1/textEmbedding",
    post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
  );
  let llm = client(spawn(router).await);

  let err = llm.embed("x", EmbeddingRole::Query).await.unwrap_err();
  match err {
    Error::Status { endpoint, status, body } => {
      assert_eq!(endpoint, "/textEmbedding");
      assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
      assert_eq!(body, "bad key");
    }
    other => panic!("expected status error, got {other:?}"),
  }
}
