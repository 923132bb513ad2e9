//! JSON REST API for Depot.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`KnowledgeStore`] and [`MarketStore`] and any provider implementing
//! [`Embedder`] and [`Completer`]. TLS and transport concerns are the
//! caller's responsibility; callers identify themselves by profile id in
//! request bodies.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", depot_api::api_router(ApiState::new(store, llm)))
//! ```

pub mod bids;
pub mod captions;
pub mod chat;
pub mod documents;
pub mod error;
pub mod extract;
pub mod hub;
pub mod messages;
pub mod orders;
pub mod profiles;

use std::sync::Arc;

use axum::{
  Router,
  extract::FromRef,
  routing::{get, post},
};
use depot_core::{
  llm::{Completer, Embedder},
  store::{KnowledgeStore, MarketStore},
};

pub use error::ApiError;
pub use hub::MessageHub;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, L> {
  pub store: Arc<S>,
  pub llm:   Arc<L>,
  pub hub:   MessageHub,
}

impl<S, L> ApiState<S, L> {
  pub fn new(store: Arc<S>, llm: Arc<L>) -> Self {
    Self { store, llm, hub: MessageHub::new() }
  }
}

// Manual impl: `S` and `L` sit behind `Arc` and need not be `Clone`.
impl<S, L> Clone for ApiState<S, L> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), llm: self.llm.clone(), hub: self.hub.clone() }
  }
}

impl<S, L> FromRef<ApiState<S, L>> for Arc<S> {
  fn from_ref(state: &ApiState<S, L>) -> Self { state.store.clone() }
}

impl<S, L> FromRef<ApiState<S, L>> for MessageHub {
  fn from_ref(state: &ApiState<S, L>) -> Self { state.hub.clone() }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, L>(state: ApiState<S, L>) -> Router<()>
where
  S: KnowledgeStore + MarketStore + 'static,
  L: Embedder + Completer + 'static,
{
  Router::new()
    // Chat
    .route("/chat", post(chat::handler::<S, L>))
    // Knowledge base
    .route("/documents", get(documents::list::<S>))
    .route(
      "/captions",
      get(captions::list::<S>)
        .put(captions::upsert::<S>)
        .delete(captions::delete_one::<S>),
    )
    .route("/captions/lookup", get(captions::lookup::<S>))
    // Profiles
    .route("/profiles", get(profiles::list::<S>).post(profiles::create::<S>))
    .route("/profiles/{id}", get(profiles::get_one::<S>))
    .route("/profiles/{id}/ban", post(profiles::ban::<S>))
    .route("/profiles/{id}/unban", post(profiles::unban::<S>))
    // Orders
    .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
    .route("/orders/{id}", get(orders::get_one::<S>))
    .route("/orders/{id}/complete", post(orders::complete::<S>))
    .route("/orders/{id}/cancel", post(orders::cancel::<S>))
    .route("/orders/{id}/dispute", post(orders::dispute::<S>))
    .route("/orders/{id}/resolve", post(orders::resolve::<S>))
    // Bids
    .route("/orders/{id}/bids", get(bids::list::<S>).post(bids::place::<S>))
    .route("/bids/{id}/accept", post(bids::accept::<S>))
    .route("/bids/{id}/reject", post(bids::reject::<S>))
    // Messages
    .route("/orders/{id}/messages", get(messages::list::<S>).post(messages::post_one::<S>))
    .route("/orders/{id}/messages/poll", get(messages::poll::<S>))
    .with_state(state)
}
