//! Handlers for bid endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/orders/{id}/bids` | Oldest first |
//! | `POST` | `/orders/{id}/bids` | Body: `{"packer_id":"...","price":1500,"days":3,"comment":"..."}`; returns 201 |
//! | `POST` | `/bids/{id}/accept` | Books the order; 409 once it is no longer `searching` |
//! | `POST` | `/bids/{id}/reject` | 409 unless the bid is `pending` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  Error as CoreError,
  market::{AcceptedBid, Bid, NewBid, UserRole},
  store::MarketStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{MessageHub, error::ApiError, extract::JsonBody, messages::post_system};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /orders/{id}/bids`
pub async fn list<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<Bid>>, ApiError> {
  store
    .get_order(order_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;
  let bids = store.list_bids(order_id).await.map_err(ApiError::store)?;
  Ok(Json(bids))
}

// ─── Place ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlaceBody {
  pub packer_id: Uuid,
  pub price:     i64,
  pub days:      u32,
  #[serde(default)]
  pub comment:   Option<String>,
}

/// `POST /orders/{id}/bids`
pub async fn place<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(order_id): Path<Uuid>,
  JsonBody(body): JsonBody<PlaceBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewBid {
    order_id,
    packer_id: body.packer_id,
    price: body.price,
    days: body.days,
    comment: body.comment.filter(|c| !c.trim().is_empty()),
  };
  input.validate()?;

  let packer = store
    .get_profile(input.packer_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::ProfileNotFound(input.packer_id))?;
  packer.ensure_active_as(UserRole::Packer)?;

  let bid = store.place_bid(input).await.map_err(ApiError::store)?;
  tracing::info!(bid_id = %bid.bid_id, %order_id, packer_id = %bid.packer_id, "bid placed");
  Ok((StatusCode::CREATED, Json(bid)))
}

// ─── Accept / reject ─────────────────────────────────────────────────────────

/// `POST /bids/{id}/accept`
pub async fn accept<S: MarketStore>(
  State(store): State<Arc<S>>,
  State(hub): State<MessageHub>,
  Path(id): Path<Uuid>,
) -> Result<Json<AcceptedBid>, ApiError> {
  let accepted = store.accept_bid(id).await.map_err(ApiError::store)?;

  let notice = format!(
    "Исполнитель выбран: {} ₽, срок {} дн. Заказ забронирован.",
    accepted.bid.price, accepted.bid.days
  );
  post_system(store.as_ref(), &hub, accepted.order.order_id, notice).await;
  Ok(Json(accepted))
}

/// `POST /bids/{id}/reject`
pub async fn reject<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Bid>, ApiError> {
  let bid = store.reject_bid(id).await.map_err(ApiError::store)?;
  Ok(Json(bid))
}
