//! Handlers for the image-caption editor.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/captions` | All captions, by URL |
//! | `GET`    | `/captions/lookup` | `?url=`; 404 if none |
//! | `PUT`    | `/captions` | Body: `{"url":"...","description":"..."}`; insert or replace |
//! | `DELETE` | `/captions` | `?url=`; 204, or 404 if none |
//!
//! Captions replace images in article text at ingestion time, so an edit
//! only reaches the chat after the article is re-ingested.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
};
use depot_core::{document::ImageCaption, store::KnowledgeStore};
use serde::Deserialize;

use crate::{error::ApiError, extract::JsonBody};

/// `GET /captions`
pub async fn list<S: KnowledgeStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ImageCaption>>, ApiError> {
  let captions = store.list_captions().await.map_err(ApiError::store)?;
  Ok(Json(captions))
}

#[derive(Debug, Deserialize)]
pub struct UrlParams {
  pub url: String,
}

/// `GET /captions/lookup?url=<url>`
pub async fn lookup<S: KnowledgeStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<UrlParams>,
) -> Result<Json<ImageCaption>, ApiError> {
  let caption = store
    .get_caption(&params.url)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no caption for {}", params.url)))?;
  Ok(Json(caption))
}

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub url:         String,
  pub description: String,
}

/// `PUT /captions`
pub async fn upsert<S: KnowledgeStore>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<UpsertBody>,
) -> Result<Json<ImageCaption>, ApiError> {
  let url = body.url.trim();
  let description = body.description.trim();
  if url.is_empty() || description.is_empty() {
    return Err(ApiError::BadRequest("url and description are required".into()));
  }
  let caption = store
    .upsert_caption(url.to_owned(), description.to_owned())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(caption))
}

/// `DELETE /captions?url=<url>`
pub async fn delete_one<S: KnowledgeStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<UrlParams>,
) -> Result<StatusCode, ApiError> {
  if store.delete_caption(&params.url).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("no caption for {}", params.url)))
  }
}
