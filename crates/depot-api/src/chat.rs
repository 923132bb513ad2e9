//! Handler for the help-centre chat endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/chat` | Body: `{"message":"...","history":[{"role":"user","text":"..."}]}` |
//!
//! Embeds the question, searches the knowledge base, and asks the completion
//! model to answer from the matched passages. Stateless: the widget sends the
//! whole history every time.

use axum::{Json, extract::State};
use depot_core::{
  chat::ChatTurn,
  llm::{Completer, Embedder, EmbeddingRole},
  rag::{self, MATCH_COUNT, MATCH_THRESHOLD},
  store::KnowledgeStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, extract::JsonBody};

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
  pub text: String,
}

/// `POST /chat`
pub async fn handler<S, L>(
  State(state): State<ApiState<S, L>>,
  JsonBody(body): JsonBody<ChatBody>,
) -> Result<Json<ChatReply>, ApiError>
where
  S: KnowledgeStore,
  L: Embedder + Completer,
{
  let message = body
    .message
    .filter(|m| !m.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("Message is required".into()))?;

  let embedding = state
    .llm
    .embed(&message, EmbeddingRole::Query)
    .await
    .map_err(|e| ApiError::internal("embedding failed", e))?;

  let passages = state
    .store
    .match_documents(embedding, MATCH_THRESHOLD, MATCH_COUNT)
    .await
    .map_err(|e| ApiError::internal("document search failed", e))?;
  tracing::debug!(matched = passages.len(), "retrieved context");

  let request = rag::build_request(&passages, body.history, &message);
  let text = state
    .llm
    .complete(&request)
    .await
    .map_err(|e| ApiError::internal("completion failed", e))?;

  Ok(Json(ChatReply { text }))
}
