//! [`KnowledgeStore`] for [`SqliteStore`].

use depot_core::{
  document::{ImageCaption, MatchedPassage, NewPassage, Passage, cosine_similarity},
  store::KnowledgeStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    PASSAGE_COLUMNS, RawCaption, RawPassage, blob_to_vec, encode_dt, encode_uuid, now,
    vec_to_blob,
  },
};

impl KnowledgeStore for SqliteStore {
  type Error = Error;

  // ── Passages ──────────────────────────────────────────────────────────────

  async fn insert_passage(&self, input: NewPassage) -> Result<Passage> {
    let passage = Passage {
      passage_id:   Uuid::new_v4(),
      content:      input.content,
      metadata:     input.metadata,
      content_hash: input.content_hash,
      created_at:   now(),
    };

    let id_str        = encode_uuid(passage.passage_id);
    let content       = passage.content.clone();
    let title         = passage.metadata.title.clone();
    let metadata_json = serde_json::to_string(&passage.metadata)?;
    let hash          = passage.content_hash.clone();
    let blob          = vec_to_blob(&input.embedding);
    let at_str        = encode_dt(passage.created_at);

    self
      .with_conn(move |conn| {
        conn.execute(
          "INSERT INTO documents
             (passage_id, content, title, metadata, content_hash, embedding, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, content, title, metadata_json, hash, blob, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(passage)
  }

  async fn has_passage_hash(&self, content_hash: &str) -> Result<bool> {
    let hash = content_hash.to_owned();
    self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM documents WHERE content_hash = ?1 LIMIT 1",
              rusqlite::params![hash],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await
  }

  async fn delete_passages_by_title(&self, title: &str) -> Result<usize> {
    let title = title.to_owned();
    self
      .with_conn(move |conn| {
        Ok(conn.execute("DELETE FROM documents WHERE title = ?1", rusqlite::params![title])?)
      })
      .await
  }

  async fn match_documents(
    &self,
    query_embedding: Vec<f32>,
    threshold: f32,
    count: usize,
  ) -> Result<Vec<MatchedPassage>> {
    self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PASSAGE_COLUMNS}, embedding FROM documents ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok((RawPassage::from_row(row)?, row.get::<_, Vec<u8>>(5)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut scored = Vec::new();
        for (raw, blob) in rows {
          let similarity = cosine_similarity(&query_embedding, &blob_to_vec(&blob)?);
          if similarity >= threshold {
            scored.push((raw, similarity));
          }
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(count);

        scored
          .into_iter()
          .map(|(raw, similarity)| {
            Ok(MatchedPassage { passage: raw.into_passage()?, similarity })
          })
          .collect()
      })
      .await
  }

  async fn list_passages(&self, limit: usize, offset: usize) -> Result<Vec<Passage>> {
    let limit = limit as i64;
    let offset = offset as i64;
    let raws: Vec<RawPassage> = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PASSAGE_COLUMNS} FROM documents
           ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], RawPassage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPassage::into_passage).collect()
  }

  // ── Captions ──────────────────────────────────────────────────────────────

  async fn upsert_caption(&self, url: String, description: String) -> Result<ImageCaption> {
    let caption = ImageCaption { url, description, updated_at: now() };

    let url         = caption.url.clone();
    let description = caption.description.clone();
    let at_str      = encode_dt(caption.updated_at);

    self
      .with_conn(move |conn| {
        conn.execute(
          "INSERT INTO image_captions (url, description, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(url) DO UPDATE SET
             description = excluded.description,
             updated_at  = excluded.updated_at",
          rusqlite::params![url, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(caption)
  }

  async fn get_caption(&self, url: &str) -> Result<Option<ImageCaption>> {
    let url = url.to_owned();
    let raw = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT url, description, updated_at FROM image_captions WHERE url = ?1",
              rusqlite::params![url],
              RawCaption::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCaption::into_caption).transpose()
  }

  async fn list_captions(&self) -> Result<Vec<ImageCaption>> {
    let raws: Vec<RawCaption> = self
      .with_conn(|conn| {
        let mut stmt =
          conn.prepare("SELECT url, description, updated_at FROM image_captions ORDER BY url")?;
        let rows = stmt
          .query_map([], RawCaption::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaption::into_caption).collect()
  }

  async fn delete_caption(&self, url: &str) -> Result<bool> {
    let url = url.to_owned();
    self
      .with_conn(move |conn| {
        let removed =
          conn.execute("DELETE FROM image_captions WHERE url = ?1", rusqlite::params![url])?;
        Ok(removed > 0)
      })
      .await
  }
}
