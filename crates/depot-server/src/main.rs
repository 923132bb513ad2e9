//! depot-server binary.
//!
//! Reads `depot.toml` (or the path given with `--config`) plus the
//! environment, opens the configured store and serves the API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use depot_core::store::{KnowledgeStore, MarketStore};
use depot_llm::LlmClient;
use depot_server::{Backend, Settings, build_app, init_tracing};
use depot_store_sqlite::SqliteStore;
use depot_store_supabase::SupabaseStore;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about = "Depot help-centre and marketplace API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "DEPOT_CONFIG", default_value = "depot.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let cli = Cli::parse();

  let settings = Settings::load(&cli.config).context("failed to read configuration")?;
  let llm = LlmClient::new(settings.llm_config()?).context("failed to build provider client")?;

  match settings.backend() {
    Backend::Sqlite => {
      let store = SqliteStore::open(&settings.store_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
      serve(&settings, store, llm).await
    }
    Backend::Supabase => {
      let store =
        SupabaseStore::new(settings.supabase_config()?).context("failed to build supabase client")?;
      serve(&settings, store, llm).await
    }
  }
}

async fn serve<S>(settings: &Settings, store: S, llm: LlmClient) -> anyhow::Result<()>
where
  S: KnowledgeStore + MarketStore + 'static,
{
  let app = build_app(store, llm);
  let address = settings.address();

  tracing::info!(backend = ?settings.backend(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
