//! Reading articles and captions from local files.
//!
//! | Input | Shape |
//! |-------|-------|
//! | `*.json` articles | `[{"title","content","source"?}]` or `{"articles":[...]}` |
//! | other articles | plain text / Markdown; one article titled by the file stem |
//! | captions | `[{"url","description"}]` or `{"<url>":"<description>"}` |

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{Error, Result};

/// One help-centre article before chunking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Article {
  pub title:   String,
  #[serde(alias = "text", alias = "body")]
  pub content: String,
  #[serde(default)]
  pub source:  Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArticleFile {
  List(Vec<Article>),
  Wrapped { articles: Vec<Article> },
}

#[derive(Deserialize)]
struct CaptionEntry {
  url:         String,
  description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaptionFile {
  List(Vec<CaptionEntry>),
  Map(BTreeMap<String, String>),
}

fn read(path: &Path) -> Result<String> {
  std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path, text: &str) -> Result<T> {
  serde_json::from_str(text).map_err(|source| Error::Parse { path: path.to_path_buf(), source })
}

fn file_name(path: &Path) -> Option<String> {
  path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn is_json(path: &Path) -> bool {
  path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load the articles in `path`. Articles without a `source` are attributed
/// to the file they came from.
pub fn load_articles(path: impl AsRef<Path>) -> Result<Vec<Article>> {
  let path = path.as_ref();
  let text = read(path)?;

  if !is_json(path) {
    let title = path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    return Ok(vec![Article { title, content: text, source: file_name(path) }]);
  }

  let articles = match parse::<ArticleFile>(path, &text)? {
    ArticleFile::List(list) => list,
    ArticleFile::Wrapped { articles } => articles,
  };
  let origin = file_name(path);
  Ok(
    articles
      .into_iter()
      .map(|mut a| {
        if a.source.is_none() {
          a.source = origin.clone();
        }
        a
      })
      .collect(),
  )
}

/// Load `(url, description)` pairs from a captions file.
pub fn load_captions(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
  let path: PathBuf = path.as_ref().to_path_buf();
  let text = read(&path)?;
  Ok(match parse::<CaptionFile>(&path, &text)? {
    CaptionFile::List(list) => list.into_iter().map(|e| (e.url, e.description)).collect(),
    CaptionFile::Map(map) => map.into_iter().collect(),
  })
}
