//! Read-only view of the knowledge base.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents` | `?limit=` (default 20, max 100), `?offset=`; newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use depot_core::{document::Passage, store::KnowledgeStore};
use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit:  Option<usize>,
  #[serde(default)]
  pub offset: usize,
}

/// `GET /documents[?limit=<n>][&offset=<n>]`
pub async fn list<S: KnowledgeStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Passage>>, ApiError> {
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
  let passages = store
    .list_passages(limit, params.offset)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(passages))
}
