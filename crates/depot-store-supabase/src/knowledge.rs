//! [`KnowledgeStore`] for [`SupabaseStore`].

use chrono::Utc;
use depot_core::{
  document::{ImageCaption, MatchedPassage, NewPassage, Passage},
  store::KnowledgeStore,
};
use serde::de::IgnoredAny;
use serde_json::json;
use uuid::Uuid;

use crate::{
  Error, Result, SupabaseStore,
  rows::{MatchRow, PASSAGE_SELECT, PassageRow},
  store::eq,
};

impl KnowledgeStore for SupabaseStore {
  type Error = Error;

  async fn insert_passage(&self, input: NewPassage) -> Result<Passage> {
    let body = json!({
      "id": Uuid::new_v4(),
      "content": input.content,
      "metadata": input.metadata,
      "content_hash": input.content_hash,
      "embedding": input.embedding,
    });
    let row: PassageRow = self
      .insert_columns("documents", PASSAGE_SELECT, &body)
      .await?;
    Ok(row.into_passage())
  }

  async fn has_passage_hash(&self, content_hash: &str) -> Result<bool> {
    let rows: Vec<IgnoredAny> = self
      .select_columns(
        "documents",
        "id",
        vec![("content_hash", eq(content_hash)), ("limit", "1".to_owned())],
      )
      .await?;
    Ok(!rows.is_empty())
  }

  async fn delete_passages_by_title(&self, title: &str) -> Result<usize> {
    let rows: Vec<IgnoredAny> = self
      .delete(
        "documents",
        vec![("metadata->>title", eq(title)), ("select", "id".to_owned())],
      )
      .await?;
    Ok(rows.len())
  }

  async fn match_documents(
    &self,
    query_embedding: Vec<f32>,
    threshold: f32,
    count: usize,
  ) -> Result<Vec<MatchedPassage>> {
    let rows: Vec<MatchRow> = self
      .rpc(
        "match_documents",
        &json!({
          "query_embedding": query_embedding,
          "match_threshold": threshold,
          "match_count": count,
        }),
      )
      .await?;
    Ok(rows.into_iter().map(MatchRow::into_match).collect())
  }

  async fn list_passages(&self, limit: usize, offset: usize) -> Result<Vec<Passage>> {
    let rows: Vec<PassageRow> = self
      .select_columns(
        "documents",
        PASSAGE_SELECT,
        vec![
          ("order", "created_at.desc,id.desc".to_owned()),
          ("limit", limit.to_string()),
          ("offset", offset.to_string()),
        ],
      )
      .await?;
    Ok(rows.into_iter().map(PassageRow::into_passage).collect())
  }

  // ── Captions ──────────────────────────────────────────────────────────────

  async fn upsert_caption(&self, url: String, description: String) -> Result<ImageCaption> {
    self
      .upsert(
        "image_captions",
        "url",
        &json!({ "url": url, "description": description, "updated_at": Utc::now() }),
      )
      .await
  }

  async fn get_caption(&self, url: &str) -> Result<Option<ImageCaption>> {
    self.select_one("image_captions", vec![("url", eq(url))]).await
  }

  async fn list_captions(&self) -> Result<Vec<ImageCaption>> {
    self
      .select("image_captions", vec![("order", "url.asc".to_owned())])
      .await
  }

  async fn delete_caption(&self, url: &str) -> Result<bool> {
    let rows: Vec<IgnoredAny> = self
      .delete("image_captions", vec![("url", eq(url)), ("select", "url".to_owned())])
      .await?;
    Ok(!rows.is_empty())
  }
}
