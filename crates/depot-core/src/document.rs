//! Knowledge-base passages and image captions.
//!
//! Passages are written once by the ingestion pipeline and read by the chat
//! endpoint and the knowledge-base reader. The embedding vector is stored
//! alongside each passage but never leaves the store through these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Passages ────────────────────────────────────────────────────────────────

/// Descriptive metadata kept next to a passage's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
  /// Title of the article the passage was cut from.
  pub title:   String,
  /// Short preview shown by the knowledge-base reader.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub snippet: Option<String>,
  /// Where the article came from (file name, URL, ...).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source:  Option<String>,
}

/// A stored chunk of knowledge-base text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
  pub passage_id:   Uuid,
  pub content:      String,
  pub metadata:     PassageMetadata,
  /// SHA-256 hex digest of `content`; used to skip duplicate ingestion.
  pub content_hash: String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::KnowledgeStore::insert_passage`].
#[derive(Debug, Clone)]
pub struct NewPassage {
  pub content:      String,
  pub metadata:     PassageMetadata,
  pub content_hash: String,
  pub embedding:    Vec<f32>,
}

/// A passage returned by similarity search, with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPassage {
  pub passage:    Passage,
  pub similarity: f32,
}

// ─── Captions ────────────────────────────────────────────────────────────────

/// A human-written description of an image, keyed by the image URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCaption {
  pub url:         String,
  pub description: String,
  pub updated_at:  DateTime<Utc>,
}

// ─── Vector helpers ──────────────────────────────────────────────────────────

/// Cosine similarity of two vectors. Returns `0.0` when the lengths differ
/// or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }
  let mut dot = 0.0f32;
  let mut norm_a = 0.0f32;
  let mut norm_b = 0.0f32;
  for (x, y) in a.iter().zip(b) {
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }
  let denom = norm_a.sqrt() * norm_b.sqrt();
  if denom == 0.0 { 0.0 } else { dot / denom }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_vectors_have_similarity_one() {
    let v = [0.3, 0.4, 0.5];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn orthogonal_vectors_have_similarity_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
  }

  #[test]
  fn mismatched_or_zero_vectors_score_zero() {
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
  }

  #[test]
  fn metadata_omits_absent_fields() {
    let meta = PassageMetadata { title: "FAQ".into(), snippet: None, source: None };
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json, serde_json::json!({ "title": "FAQ" }));
  }
}
