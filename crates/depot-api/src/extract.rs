//! Extractors whose rejections use the API's `{"error": ...}` body.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// [`axum::Json`] that rejects a missing content type, malformed JSON or a
/// body of the wrong shape with `400 {"error": ...}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
