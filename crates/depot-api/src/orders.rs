//! Handlers for `/orders` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/orders` | Optional `?status=`, `?client_id=`, `?packer_id=` |
//! | `POST` | `/orders` | Body: `{"client_id":"...","title":"...","description":"..."}`; returns 201 |
//! | `GET`  | `/orders/{id}` | 404 if not found |
//! | `POST` | `/orders/{id}/complete` | `booked` → `completed` |
//! | `POST` | `/orders/{id}/cancel` | `searching`/`booked` → `cancelled` |
//! | `POST` | `/orders/{id}/dispute` | Body: `{"actor_id":"...","reason":"..."}` |
//! | `POST` | `/orders/{id}/resolve` | Body: `{"actor_id":"<admin/manager>","outcome":"completed"}` |
//!
//! State-machine violations answer 409.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  Error as CoreError,
  market::{NewOrder, Order, OrderQuery, OrderStatus, UserRole},
  store::MarketStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  MessageHub, error::ApiError, extract::JsonBody, messages::post_system, profiles::require_actor,
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /orders[?status=<status>][&client_id=<id>][&packer_id=<id>]`
pub async fn list<S: MarketStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
  let orders = store.list_orders(&query).await.map_err(ApiError::store)?;
  Ok(Json(orders))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /orders`
pub async fn create<S: MarketStore>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<NewOrder>,
) -> Result<impl IntoResponse, ApiError> {
  if body.title.trim().is_empty() {
    return Err(ApiError::BadRequest("title is required".into()));
  }
  let client = store
    .get_profile(body.client_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::ProfileNotFound(body.client_id))?;
  client.ensure_active_as(UserRole::Client)?;

  let order = store.create_order(body).await.map_err(ApiError::store)?;
  tracing::info!(order_id = %order.order_id, client_id = %order.client_id, "order created");
  Ok((StatusCode::CREATED, Json(order)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /orders/{id}`
pub async fn get_one<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
  let order = store
    .get_order(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
  Ok(Json(order))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /orders/{id}/complete`
pub async fn complete<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
  let order = store
    .transition_order(id, OrderStatus::Completed)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(order))
}

/// `POST /orders/{id}/cancel`
pub async fn cancel<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
  let order = store
    .transition_order(id, OrderStatus::Cancelled)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(order))
}

// ─── Disputes ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DisputeBody {
  pub actor_id: Uuid,
  #[serde(default)]
  pub reason:   Option<String>,
}

/// `POST /orders/{id}/dispute`
pub async fn dispute<S: MarketStore>(
  State(store): State<Arc<S>>,
  State(hub): State<MessageHub>,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<DisputeBody>,
) -> Result<Json<Order>, ApiError> {
  require_actor(store.as_ref(), body.actor_id).await?;
  let order = store.open_dispute(id).await.map_err(ApiError::store)?;
  tracing::info!(order_id = %id, actor_id = %body.actor_id, "dispute opened");

  let mut notice = String::from("По заказу открыт спор. Арбитр подключится к чату.");
  if let Some(reason) = body.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
    notice.push_str(&format!("\nПричина: {reason}"));
  }
  post_system(store.as_ref(), &hub, id, notice).await;
  Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub actor_id: Uuid,
  /// Status to move the order to while closing the dispute.
  #[serde(default)]
  pub outcome:  Option<OrderStatus>,
}

/// `POST /orders/{id}/resolve`
pub async fn resolve<S: MarketStore>(
  State(store): State<Arc<S>>,
  State(hub): State<MessageHub>,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<ResolveBody>,
) -> Result<Json<Order>, ApiError> {
  let actor = require_actor(store.as_ref(), body.actor_id).await?;
  if !actor.role.can_arbitrate() {
    return Err(ApiError::Forbidden(format!(
      "profile {} cannot resolve disputes",
      actor.profile_id
    )));
  }

  let order = store
    .resolve_dispute(id, body.outcome)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(order_id = %id, actor_id = %body.actor_id, status = %order.status, "dispute resolved");

  let notice = match body.outcome {
    Some(OrderStatus::Completed) => "Спор закрыт арбитром. Заказ завершён.",
    Some(OrderStatus::Cancelled) => "Спор закрыт арбитром. Заказ отменён.",
    _ => "Спор закрыт арбитром.",
  };
  post_system(store.as_ref(), &hub, id, notice).await;
  Ok(Json(order))
}
