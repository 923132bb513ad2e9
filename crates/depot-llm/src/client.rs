//! Async HTTP client for the hosted embedding and completion models.

use std::time::Duration;

use depot_core::{
  chat::ChatRole,
  llm::{Completer, CompletionRequest, Embedder, EmbeddingRole},
};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
  Error, Result,
  wire::{self, CompletionOptions, WireMessage},
};

pub const DEFAULT_BASE_URL: &str = "https://llm.api.cloud.yandex.net";
pub const DEFAULT_COMPLETION_MODEL: &str = "yandexgpt-lite/latest";

/// Sampling parameters used for every chat completion.
pub const TEMPERATURE: f32 = 0.3;
pub const MAX_TOKENS: u32 = 2000;

/// Connection settings for the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  pub api_key:          String,
  pub folder_id:        String,
  #[serde(default = "default_base_url")]
  pub base_url:         String,
  /// Model path under the folder, e.g. `yandexgpt-lite/latest`.
  #[serde(default = "default_completion_model")]
  pub completion_model: String,
  /// Per-request timeout. `None` keeps the HTTP client's default.
  #[serde(default)]
  pub timeout_secs:     Option<u64>,
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_owned() }

fn default_completion_model() -> String { DEFAULT_COMPLETION_MODEL.to_owned() }

impl LlmConfig {
  pub fn new(api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
    Self {
      api_key:          api_key.into(),
      folder_id:        folder_id.into(),
      base_url:         default_base_url(),
      completion_model: default_completion_model(),
      timeout_secs:     None,
    }
  }

  /// Model URI for the embedding model paired with `role`.
  pub fn embedding_model_uri(&self, role: EmbeddingRole) -> String {
    let model = match role {
      EmbeddingRole::Query => "text-search-query",
      EmbeddingRole::Document => "text-search-doc",
    };
    format!("emb://{}/{model}/latest", self.folder_id)
  }

  pub fn completion_model_uri(&self) -> String {
    format!("gpt://{}/{}", self.folder_id, self.completion_model)
  }
}

/// Client for the embedding and completion endpoints.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based. Build one
/// at startup and share it.
#[derive(Clone)]
pub struct LlmClient {
  client: Client,
  config: LlmConfig,
}

impl LlmClient {
  pub fn new(config: LlmConfig) -> Result<Self> {
    if config.api_key.is_empty() {
      return Err(Error::Config("api_key"));
    }
    if config.folder_id.is_empty() {
      return Err(Error::Config("folder_id"));
    }
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(Self { client: builder.build()?, config })
  }

  pub fn config(&self) -> &LlmConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/foundationModels/v1{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  async fn post<B, T>(&self, endpoint: &'static str, body: &B) -> Result<T>
  where
    B: serde::Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let resp = self
      .client
      .post(self.url(endpoint))
      .header(
        reqwest::header::AUTHORIZATION,
        format!("Api-Key {}", self.config.api_key),
      )
      .json(body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { endpoint, status, body });
    }
    Ok(resp.json().await?)
  }

  /// `POST /textEmbedding`
  pub async fn embed_text(&self, text: &str, role: EmbeddingRole) -> Result<Vec<f32>> {
    let model_uri = self.config.embedding_model_uri(role);
    let resp: wire::EmbeddingResponse = self
      .post("/textEmbedding", &wire::EmbeddingRequest { model_uri: &model_uri, text })
      .await?;
    tracing::debug!(?role, dims = resp.embedding.len(), "embedded text");
    Ok(resp.embedding)
  }

  /// `POST /completion`, returning the first alternative's text.
  pub async fn complete_chat(&self, request: &CompletionRequest) -> Result<String> {
    let model_uri = self.config.completion_model_uri();

    let mut messages = Vec::with_capacity(request.turns.len() + 1);
    messages.push(WireMessage { role: "system", text: &request.system });
    messages.extend(request.turns.iter().map(|turn| WireMessage {
      role: match turn.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
      },
      text: &turn.text,
    }));

    let body = wire::CompletionRequest {
      model_uri: &model_uri,
      completion_options: CompletionOptions {
        stream:      false,
        temperature: TEMPERATURE,
        max_tokens:  MAX_TOKENS,
      },
      messages,
    };

    let resp: wire::CompletionResponse = self.post("/completion", &body).await?;
    resp
      .result
      .alternatives
      .into_iter()
      .next()
      .map(|alt| alt.message.text)
      .ok_or(Error::NoAlternatives)
  }
}

impl Embedder for LlmClient {
  type Error = Error;

  async fn embed(&self, text: &str, role: EmbeddingRole) -> Result<Vec<f32>> {
    self.embed_text(text, role).await
  }
}

impl Completer for LlmClient {
  type Error = Error;

  async fn complete(&self, request: &CompletionRequest) -> Result<String> {
    self.complete_chat(request).await
  }
}
