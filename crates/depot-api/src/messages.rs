//! Handlers for order chat endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/orders/{id}/messages` | Optional `?packer_id=` selects one pre-booking thread |
//! | `POST` | `/orders/{id}/messages` | Body: `{"sender_id":"...","packer_id":"...","content":"..."}`; returns 201 |
//! | `GET`  | `/orders/{id}/messages/poll` | `?since=<rfc3339>&packer_id=&timeout_secs=`; long-poll |
//!
//! The poll endpoint answers as soon as at least one message newer than
//! `since` exists, or with an empty list when the timeout elapses.

use std::{sync::Arc, time::Duration};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use depot_core::{
  market::{Message, MessageFeed, NewMessage},
  store::MarketStore,
};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{MessageHub, error::ApiError, extract::JsonBody, profiles::require_actor};

pub const DEFAULT_POLL_SECS: u64 = 25;
pub const MAX_POLL_SECS: u64 = 60;

/// Post a platform notice to an order's chat.
///
/// The state change it announces has already been committed, so a failure
/// here is logged and otherwise ignored.
pub(crate) async fn post_system<S: MarketStore>(
  store: &S,
  hub: &MessageHub,
  order_id: Uuid,
  content: impl Into<String>,
) {
  match store.post_message(NewMessage::system(order_id, content)).await {
    Ok(message) => hub.publish(message),
    Err(e) => tracing::warn!(%order_id, error = %e, "failed to post system message"),
  }
}

async fn require_order<S: MarketStore>(store: &S, id: Uuid) -> Result<(), ApiError> {
  store
    .get_order(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
  Ok(())
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub packer_id: Option<Uuid>,
}

/// `GET /orders/{id}/messages[?packer_id=<id>]`
pub async fn list<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(order_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
  require_order(store.as_ref(), order_id).await?;
  let messages = store
    .list_messages(order_id, params.packer_id, None)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub sender_id: Uuid,
  #[serde(default)]
  pub packer_id: Option<Uuid>,
  #[serde(default)]
  pub content:   String,
}

/// `POST /orders/{id}/messages`
pub async fn post_one<S: MarketStore>(
  State(store): State<Arc<S>>,
  State(hub): State<MessageHub>,
  Path(order_id): Path<Uuid>,
  JsonBody(body): JsonBody<PostBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.content.trim().is_empty() {
    return Err(ApiError::BadRequest("Message content is required".into()));
  }
  require_actor(store.as_ref(), body.sender_id).await?;

  let message = store
    .post_message(NewMessage {
      order_id,
      sender_id: Some(body.sender_id),
      packer_id: body.packer_id,
      content: body.content,
      is_system: false,
    })
    .await
    .map_err(ApiError::store)?;

  hub.publish(message.clone());
  Ok((StatusCode::CREATED, Json(message)))
}

// ─── Poll ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PollParams {
  /// Only messages created strictly after this instant.
  pub since:        Option<DateTime<Utc>>,
  pub packer_id:    Option<Uuid>,
  pub timeout_secs: Option<u64>,
}

/// Wait for the next published message in the subscribed stream. `None`
/// when the receiver lagged or the hub closed; the caller re-reads the store.
async fn next_matching(
  rx: &mut broadcast::Receiver<Message>,
  order_id: Uuid,
  packer_id: Option<Uuid>,
  since: Option<DateTime<Utc>>,
) -> Option<Message> {
  loop {
    match rx.recv().await {
      Ok(m) if m.matches(order_id, packer_id) && since.is_none_or(|s| m.created_at > s) => {
        return Some(m);
      }
      Ok(_) => continue,
      Err(RecvError::Lagged(skipped)) => {
        tracing::debug!(skipped, "poll subscriber lagged");
        return None;
      }
      Err(RecvError::Closed) => return None,
    }
  }
}

/// `GET /orders/{id}/messages/poll`
pub async fn poll<S: MarketStore>(
  State(store): State<Arc<S>>,
  State(hub): State<MessageHub>,
  Path(order_id): Path<Uuid>,
  Query(params): Query<PollParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
  // Subscribe first so a message posted during the store read still wakes us.
  let mut rx = hub.subscribe();
  require_order(store.as_ref(), order_id).await?;

  let mut feed = MessageFeed::new();
  feed.extend(
    store
      .list_messages(order_id, params.packer_id, params.since)
      .await
      .map_err(ApiError::store)?,
  );
  if !feed.is_empty() {
    return Ok(Json(feed.into_vec()));
  }

  let wait = Duration::from_secs(
    params.timeout_secs.unwrap_or(DEFAULT_POLL_SECS).min(MAX_POLL_SECS),
  );
  let woke = tokio::time::timeout(
    wait,
    next_matching(&mut rx, order_id, params.packer_id, params.since),
  )
  .await;

  if let Ok(delivered) = woke {
    feed.extend(delivered);
    // Anything else that landed meanwhile; the feed drops the copy we
    // already hold.
    feed.extend(
      store
        .list_messages(order_id, params.packer_id, params.since)
        .await
        .map_err(ApiError::store)?,
    );
  }
  Ok(Json(feed.into_vec()))
}
