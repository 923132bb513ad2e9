//! Process wiring for Depot: settings, logging and the outer HTTP router.
//!
//! Both binaries (`depot-server` and `ingest`) load one [`Settings`], build
//! one store and one provider client from it, and pass those down.

pub mod settings;

pub use settings::{Backend, Settings, SettingsError};

use std::sync::Arc;

use axum::{Router, routing::get};
use depot_api::{ApiState, api_router};
use depot_core::{
  llm::{Completer, Embedder},
  store::{KnowledgeStore, MarketStore},
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Log to stderr at `INFO` unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();
}

/// Mount `api` under `/api` next to `/health`, with permissive CORS and
/// request tracing.
pub fn app(api: Router) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(TraceLayer::new_for_http())
}

/// The full application for one store and one provider client.
pub fn build_app<S, L>(store: S, llm: L) -> Router
where
  S: KnowledgeStore + MarketStore + 'static,
  L: Embedder + Completer + 'static,
{
  app(api_router(ApiState::new(Arc::new(store), Arc::new(llm))))
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests;
