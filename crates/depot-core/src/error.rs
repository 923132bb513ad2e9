//! Error types for `depot-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::market::{OrderStatus, UserRole};

#[derive(Debug, Error)]
pub enum Error {
  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("order not found: {0}")]
  OrderNotFound(Uuid),

  #[error("bid not found: {0}")]
  BidNotFound(Uuid),

  #[error("order cannot move from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("order {order_id} is {status}, not open for bidding")]
  OrderNotOpen { order_id: Uuid, status: OrderStatus },

  #[error("bid {0} is no longer pending")]
  BidNotPending(Uuid),

  #[error("order {order_id} is {status} and cannot be disputed")]
  NotDisputable { order_id: Uuid, status: OrderStatus },

  #[error("order {0} is already disputed")]
  AlreadyDisputed(Uuid),

  #[error("order {0} has no open dispute")]
  NotDisputed(Uuid),

  #[error("profile {0} is banned")]
  Banned(Uuid),

  #[error("profile {profile_id} must have role {expected}")]
  RoleMismatch { profile_id: Uuid, expected: UserRole },

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so higher layers can recover the
/// domain cause of a failure (not found, illegal transition, ...) without
/// knowing the concrete backend.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

impl DomainError for std::convert::Infallible {
  fn domain(&self) -> Option<&Error> { match *self {} }
}
