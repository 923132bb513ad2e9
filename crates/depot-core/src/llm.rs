//! Traits for the hosted embedding and completion provider.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::chat::ChatTurn;

/// Which embedding model to use: questions and stored passages are embedded
/// by different, paired models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingRole {
  Query,
  Document,
}

/// Turns text into a fixed-length vector.
pub trait Embedder: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn embed<'a>(
    &'a self,
    text: &'a str,
    role: EmbeddingRole,
  ) -> impl Future<Output = Result<Vec<f32>, Self::Error>> + Send + 'a;
}

/// A fully-assembled completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
  /// Instructions plus retrieved context.
  pub system: String,
  /// Prior conversation followed by the current question.
  pub turns:  Vec<ChatTurn>,
}

/// Generates the assistant's reply for a conversation.
pub trait Completer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn complete<'a>(
    &'a self,
    request: &'a CompletionRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
