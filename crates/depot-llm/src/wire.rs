//! JSON bodies of the Foundation Models REST API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRequest<'a> {
  pub model_uri: &'a str,
  pub text:      &'a str,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
  pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
  pub stream:      bool,
  pub temperature: f32,
  pub max_tokens:  u32,
}

#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
  pub role: &'static str,
  pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest<'a> {
  pub model_uri:          &'a str,
  pub completion_options: CompletionOptions,
  pub messages:           Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
  pub result: CompletionResult,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResult {
  #[serde(default)]
  pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
pub struct Alternative {
  pub message: AlternativeMessage,
}

#[derive(Debug, Deserialize)]
pub struct AlternativeMessage {
  pub text: String,
}
