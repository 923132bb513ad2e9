//! Replacing image references with their captions.
//!
//! Images carry no meaning for the embedding model, so before chunking every
//! image in an article is swapped for a bracketed description:
//!
//! * `![alt](url)`: the stored caption for `url`, else `alt`; an image with
//!   neither is dropped.
//! * a bare image URL: replaced only when a caption for it is stored.

use std::collections::HashMap;

use depot_core::{document::ImageCaption, store::KnowledgeStore};
use regex::{Captures, Regex};

use crate::{Error, Result};

const MARKDOWN_IMAGE: &str = r#"!\[([^\]]*)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#;
const BARE_IMAGE_URL: &str = r"(?i)https?://[^\s)\]]+\.(?:png|jpe?g|gif|webp|svg|bmp)(?:\?[^\s)\]]*)?";

fn placeholder(description: &str) -> String { format!("[Изображение: {description}]") }

/// Caption lookup by image URL, with the patterns used to find images.
#[derive(Debug, Clone)]
pub struct CaptionIndex {
  captions:       HashMap<String, String>,
  markdown_image: Regex,
  bare_url:       Regex,
}

impl CaptionIndex {
  pub fn new(captions: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
    Ok(Self {
      captions:       captions.into_iter().collect(),
      markdown_image: Regex::new(MARKDOWN_IMAGE)?,
      bare_url:       Regex::new(BARE_IMAGE_URL)?,
    })
  }

  pub fn from_captions(captions: Vec<ImageCaption>) -> Result<Self> {
    Self::new(captions.into_iter().map(|c| (c.url, c.description)))
  }

  /// Load every stored caption.
  pub async fn load<S: KnowledgeStore>(store: &S) -> Result<Self> {
    let captions = store
      .list_captions()
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    Self::from_captions(captions)
  }

  pub fn len(&self) -> usize { self.captions.len() }

  pub fn is_empty(&self) -> bool { self.captions.is_empty() }

  pub fn get(&self, url: &str) -> Option<&str> { self.captions.get(url).map(String::as_str) }

  /// Replace every image reference in `text`.
  pub fn enrich(&self, text: &str) -> String {
    let text = self.markdown_image.replace_all(text, |caps: &Captures<'_>| {
      let alt = caps[1].trim();
      match self.get(&caps[2]) {
        Some(description) => placeholder(description),
        None if !alt.is_empty() => placeholder(alt),
        None => String::new(),
      }
    });
    self
      .bare_url
      .replace_all(&text, |caps: &Captures<'_>| match self.get(&caps[0]) {
        Some(description) => placeholder(description),
        None => caps[0].to_owned(),
      })
      .into_owned()
  }
}

/// Outcome of a caption import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionReport {
  pub imported: usize,
  pub failed:   usize,
}

/// Upsert `(url, description)` pairs. Blank entries and store failures are
/// logged and counted as failed.
pub async fn import_captions<S: KnowledgeStore>(
  store: &S,
  entries: Vec<(String, String)>,
) -> CaptionReport {
  let mut report = CaptionReport::default();
  for (url, description) in entries {
    let (url, description) = (url.trim().to_owned(), description.trim().to_owned());
    if url.is_empty() || description.is_empty() {
      tracing::warn!(%url, "skipping caption with empty url or description");
      report.failed += 1;
      continue;
    }
    match store.upsert_caption(url.clone(), description).await {
      Ok(_) => report.imported += 1,
      Err(e) => {
        tracing::warn!(%url, error = %e, "failed to store caption");
        report.failed += 1;
      }
    }
  }
  tracing::info!(imported = report.imported, failed = report.failed, "captions imported");
  report
}
