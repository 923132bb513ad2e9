//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profiles` | Optional `?role=admin\|manager\|packer\|client` |
//! | `POST` | `/profiles` | Body: `{"role":"packer","display_name":"..."}` |
//! | `GET`  | `/profiles/{id}` | 404 if not found |
//! | `POST` | `/profiles/{id}/ban` | Body: `{"actor_id":"<admin>"}` |
//! | `POST` | `/profiles/{id}/unban` | Body: `{"actor_id":"<admin>"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  market::{NewProfile, Profile, UserRole},
  store::MarketStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, extract::JsonBody};

/// Load the profile performing an action. Unknown and banned actors are
/// refused with 403.
pub(crate) async fn require_actor<S: MarketStore>(store: &S, id: Uuid) -> Result<Profile, ApiError> {
  let actor = store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Forbidden(format!("unknown actor {id}")))?;
  actor.ensure_not_banned()?;
  Ok(actor)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<UserRole>,
}

/// `GET /profiles[?role=<role>]`
pub async fn list<S: MarketStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Profile>>, ApiError> {
  let profiles = store.list_profiles(params.role).await.map_err(ApiError::store)?;
  Ok(Json(profiles))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /profiles`
pub async fn create<S: MarketStore>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<NewProfile>,
) -> Result<impl IntoResponse, ApiError> {
  if body.display_name.trim().is_empty() {
    return Err(ApiError::BadRequest("display_name is required".into()));
  }
  let profile = store.create_profile(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /profiles/{id}`
pub async fn get_one<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
  let profile = store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}

// ─── Ban / unban ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActorBody {
  pub actor_id: Uuid,
}

async fn set_banned<S: MarketStore>(
  store: &S,
  id: Uuid,
  actor_id: Uuid,
  banned: bool,
) -> Result<Json<Profile>, ApiError> {
  require_actor(store, actor_id).await?.ensure_active_as(UserRole::Admin)?;
  let profile = store.set_banned(id, banned).await.map_err(ApiError::store)?;
  tracing::info!(profile_id = %id, %actor_id, banned, "profile ban flag changed");
  Ok(Json(profile))
}

/// `POST /profiles/{id}/ban`
pub async fn ban<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<ActorBody>,
) -> Result<Json<Profile>, ApiError> {
  set_banned(store.as_ref(), id, body.actor_id, true).await
}

/// `POST /profiles/{id}/unban`
pub async fn unban<S: MarketStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<ActorBody>,
) -> Result<Json<Profile>, ApiError> {
  set_banned(store.as_ref(), id, body.actor_id, false).await
}
