//! Error type for `depot-llm`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{endpoint} returned {status}: {body}")]
  Status {
    endpoint: &'static str,
    status:   reqwest::StatusCode,
    body:     String,
  },

  #[error("completion response contained no alternatives")]
  NoAlternatives,

  #[error("missing configuration: {0}")]
  Config(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
