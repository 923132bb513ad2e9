//! Error type for `depot-store-supabase`.

use depot_core::DomainError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] depot_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// PostgREST answered with a non-2xx status.
  #[error("{endpoint} returned {status}: {body}")]
  Status {
    endpoint: String,
    status:   reqwest::StatusCode,
    body:     String,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A guarded update kept losing to concurrent writers.
  #[error("order {0} kept changing while it was being updated")]
  Contended(Uuid),

  #[error("missing configuration: {0}")]
  Config(&'static str),
}

impl DomainError for Error {
  fn domain(&self) -> Option<&depot_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
