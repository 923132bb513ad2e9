//! Row shapes returned by PostgREST that differ from the domain types.
//!
//! Profiles, orders, bids, messages and captions use the domain field names
//! as column names and deserialize directly.

use chrono::{DateTime, Utc};
use depot_core::document::{MatchedPassage, Passage, PassageMetadata};
use serde::Deserialize;
use uuid::Uuid;

/// Columns selected from `documents`; the embedding stays in the database.
pub(crate) const PASSAGE_SELECT: &str = "id,content,metadata,content_hash,created_at";

#[derive(Debug, Deserialize)]
pub(crate) struct PassageRow {
  pub id:           Uuid,
  pub content:      String,
  pub metadata:     PassageMetadata,
  pub content_hash: String,
  pub created_at:   DateTime<Utc>,
}

impl PassageRow {
  pub fn into_passage(self) -> Passage {
    Passage {
      passage_id:   self.id,
      content:      self.content,
      metadata:     self.metadata,
      content_hash: self.content_hash,
      created_at:   self.created_at,
    }
  }
}

/// A row of the `match_documents` function.
///
/// Deployed versions of the function return only `id, content, metadata,
/// similarity`; the hash and timestamp are read when present.
#[derive(Debug, Deserialize)]
pub(crate) struct MatchRow {
  pub id:           Uuid,
  pub content:      String,
  pub metadata:     PassageMetadata,
  #[serde(default)]
  pub content_hash: Option<String>,
  #[serde(default)]
  pub created_at:   Option<DateTime<Utc>>,
  pub similarity:   f32,
}

impl MatchRow {
  pub fn into_match(self) -> MatchedPassage {
    MatchedPassage {
      passage:    Passage {
        passage_id:   self.id,
        content:      self.content,
        metadata:     self.metadata,
        content_hash: self.content_hash.unwrap_or_default(),
        created_at:   self.created_at.unwrap_or_default(),
      },
      similarity: self.similarity,
    }
  }
}
