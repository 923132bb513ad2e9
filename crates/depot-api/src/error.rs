//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use depot_core::{DomainError, Error as CoreError};
use serde_json::json;
use thiserror::Error;

/// Body text of every 500 response. The cause is only logged.
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request conflicts with the record's current state.
  #[error("conflict: {0}")]
  Conflict(String),

  /// The acting profile may not perform the operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("{context}: {source}")]
  Internal {
    context: &'static str,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Map a store error to a response class through its domain cause.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match err.domain().and_then(classify) {
      Some(mapped) => mapped,
      None => Self::internal("store error", err),
    }
  }

  /// An upstream failure reported to the client as a bare 500.
  pub fn internal<E>(context: &'static str, err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Internal { context, source: Box::new(err) }
  }
}

/// The client-facing class of a domain error, or `None` for failures that
/// are the server's fault.
fn classify(err: &CoreError) -> Option<ApiError> {
  let message = err.to_string();
  match err {
    CoreError::ProfileNotFound(_) | CoreError::OrderNotFound(_) | CoreError::BidNotFound(_) => {
      Some(ApiError::NotFound(message))
    }
    CoreError::InvalidTransition { .. }
    | CoreError::OrderNotOpen { .. }
    | CoreError::BidNotPending(_)
    | CoreError::NotDisputable { .. }
    | CoreError::AlreadyDisputed(_)
    | CoreError::NotDisputed(_) => Some(ApiError::Conflict(message)),
    CoreError::Banned(_) | CoreError::RoleMismatch { .. } => Some(ApiError::Forbidden(message)),
    CoreError::InvalidInput(_) => Some(ApiError::BadRequest(message)),
    CoreError::UnknownVariant { .. } | CoreError::Serialization(_) => None,
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match classify(&err) {
      Some(mapped) => mapped,
      None => Self::internal("domain error", err),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Internal { context, source } => {
        tracing::error!(error = %source, "{context}");
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
