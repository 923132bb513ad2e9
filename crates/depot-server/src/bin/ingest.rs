//! ingest binary: loads help-centre articles and image captions into the
//! knowledge base of the configured store.
//!
//! ```text
//! ingest articles faq.json returns.md --replace
//! ingest captions captions.json
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use depot_core::store::KnowledgeStore;
use depot_ingest::{
  CaptionIndex, IngestOptions, Ingestor, import_captions, load_articles, load_captions,
};
use depot_llm::LlmClient;
use depot_server::{Backend, Settings, init_tracing};
use depot_store_sqlite::SqliteStore;
use depot_store_supabase::SupabaseStore;

/// Embedding calls made while ingesting get a fixed timeout.
const EMBED_TIMEOUT_SECS: u64 = 20;

#[derive(Parser)]
#[command(author, version, about = "Load articles and image captions into Depot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "DEPOT_CONFIG", default_value = "depot.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Chunk, embed and store articles from JSON, Markdown or text files.
  Articles {
    #[arg(required = true)]
    files:   Vec<PathBuf>,
    /// Delete passages with the same title before inserting.
    #[arg(long)]
    replace: bool,
  },
  /// Import image captions from a JSON file.
  Captions { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let cli = Cli::parse();

  let settings = Settings::load(&cli.config).context("failed to read configuration")?;

  match settings.backend() {
    Backend::Sqlite => {
      tracing::info!(path = %settings.store_path.display(), "writing to sqlite store");
      let store = SqliteStore::open(&settings.store_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
      run(&settings, &store, cli.command).await
    }
    Backend::Supabase => {
      let config = settings.supabase_config()?;
      tracing::info!(url = %config.url, "writing to supabase store");
      let store = SupabaseStore::new(config).context("failed to build supabase client")?;
      run(&settings, &store, cli.command).await
    }
  }
}

async fn run<S: KnowledgeStore>(settings: &Settings, store: &S, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Articles { files, replace } => {
      let mut llm_config = settings.llm_config()?;
      llm_config.timeout_secs = Some(EMBED_TIMEOUT_SECS);
      let llm = LlmClient::new(llm_config).context("failed to build provider client")?;

      let mut articles = Vec::new();
      for file in &files {
        match load_articles(file) {
          Ok(mut loaded) => {
            tracing::info!(file = %file.display(), articles = loaded.len(), "loaded");
            articles.append(&mut loaded);
          }
          Err(e) => tracing::warn!(error = %e, "skipping file"),
        }
      }

      let captions = CaptionIndex::load(store).await.context("failed to load captions")?;
      tracing::info!(captions = captions.len(), "caption index ready");

      let report = Ingestor::new(store, &llm, captions, IngestOptions { replace })
        .run(articles)
        .await;
      println!(
        "articles: {}, inserted: {}, skipped: {}, replaced: {}, failed: {}",
        report.articles, report.inserted, report.skipped, report.replaced, report.failed
      );
    }
    Command::Captions { file } => {
      let entries = load_captions(&file)?;
      let report = import_captions(store, entries).await;
      println!("imported: {}, failed: {}", report.imported, report.failed);
    }
  }
  Ok(())
}
