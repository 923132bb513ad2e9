//! Ingestion pipeline orchestration.
//!
//! Per article: optional delete-by-title → caption enrichment → chunking →
//! per chunk: hash check → document embedding → insert. Nothing is rolled
//! back; a failed chunk leaves the ones before it in place and a re-run
//! fills in the gaps thanks to the hash check.

use depot_core::{
  document::{NewPassage, PassageMetadata},
  llm::{Embedder, EmbeddingRole},
  store::KnowledgeStore,
};
use sha2::{Digest, Sha256};

use crate::{Article, CaptionIndex, chunk::chunk_text};

/// Upper bound on passage length, in characters.
pub const MAX_CHUNK_CHARS: usize = 1000;

/// Length of the preview stored in passage metadata, in characters.
pub const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
  /// Delete passages previously ingested under the same title first.
  pub replace: bool,
}

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
  pub articles: usize,
  pub inserted: usize,
  /// Chunks whose content hash was already stored.
  pub skipped:  usize,
  /// Passages removed by `replace`.
  pub replaced: usize,
  pub failed:   usize,
}

impl IngestReport {
  pub fn has_failures(&self) -> bool { self.failed > 0 }
}

/// SHA-256 of `content` as lowercase hex.
pub fn content_hash(content: &str) -> String {
  hex::encode(Sha256::digest(content.as_bytes()))
}

fn snippet(content: &str) -> String { content.chars().take(SNIPPET_CHARS).collect() }

/// Writes articles into a knowledge store.
pub struct Ingestor<'a, S, E> {
  store:    &'a S,
  embedder: &'a E,
  captions: CaptionIndex,
  options:  IngestOptions,
}

impl<'a, S, E> Ingestor<'a, S, E>
where
  S: KnowledgeStore,
  E: Embedder,
{
  pub fn new(store: &'a S, embedder: &'a E, captions: CaptionIndex, options: IngestOptions) -> Self {
    Self { store, embedder, captions, options }
  }

  /// Ingest every article, logging and counting failures.
  pub async fn run(&self, articles: Vec<Article>) -> IngestReport {
    let mut report = IngestReport::default();
    for article in articles {
      self.ingest_article(article, &mut report).await;
    }
    tracing::info!(
      articles = report.articles,
      inserted = report.inserted,
      skipped = report.skipped,
      replaced = report.replaced,
      failed = report.failed,
      "ingestion finished"
    );
    report
  }

  async fn ingest_article(&self, article: Article, report: &mut IngestReport) {
    report.articles += 1;
    let title = article.title.trim().to_owned();
    if title.is_empty() {
      tracing::warn!(source = ?article.source, "skipping article without a title");
      report.failed += 1;
      return;
    }

    if self.options.replace {
      match self.store.delete_passages_by_title(&title).await {
        Ok(n) => report.replaced += n,
        Err(e) => {
          // Inserting next to the stale passages would leave both versions.
          tracing::warn!(%title, error = %e, "failed to delete old passages, skipping article");
          report.failed += 1;
          return;
        }
      }
    }

    let text = self.captions.enrich(&article.content);
    let chunks = chunk_text(&text, MAX_CHUNK_CHARS);
    tracing::debug!(%title, chunks = chunks.len(), "chunked article");

    for (index, content) in chunks.into_iter().enumerate() {
      let metadata = PassageMetadata {
        title:   title.clone(),
        snippet: Some(snippet(&content)),
        source:  article.source.clone(),
      };
      self.ingest_chunk(content, metadata, index, report).await;
    }
  }

  async fn ingest_chunk(
    &self,
    content: String,
    metadata: PassageMetadata,
    index: usize,
    report: &mut IngestReport,
  ) {
    let hash = content_hash(&content);
    match self.store.has_passage_hash(&hash).await {
      Ok(true) => {
        report.skipped += 1;
        return;
      }
      Ok(false) => {}
      Err(e) => {
        tracing::warn!(title = %metadata.title, index, error = %e, "hash lookup failed");
        report.failed += 1;
        return;
      }
    }

    let embedding = match self.embedder.embed(&content, EmbeddingRole::Document).await {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!(title = %metadata.title, index, error = %e, "embedding failed");
        report.failed += 1;
        return;
      }
    };

    let title = metadata.title.clone();
    let passage = NewPassage { content, metadata, content_hash: hash, embedding };
    match self.store.insert_passage(passage).await {
      Ok(_) => report.inserted += 1,
      Err(e) => {
        tracing::warn!(%title, index, error = %e, "insert failed");
        report.failed += 1;
      }
    }
  }
}
