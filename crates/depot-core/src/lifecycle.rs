//! The order state machine.
//!
//! ```text
//! searching ──accept bid──▶ booked ──complete──▶ completed
//!     │                       │
//!     └──────cancel───────────┴──────▶ cancelled
//! ```
//!
//! `is_disputed` is orthogonal to the status: it can be raised on `booked`
//! or `completed` orders and is cleared by an arbiter.
//!
//! Backends call these checks inside the same transaction (or conditional
//! update) that performs the write, so a check never races its write.

use crate::{
  Error, Result,
  market::{Order, OrderStatus},
};

impl OrderStatus {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }

  /// Whether `self → next` is an edge of the state machine.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Searching, Booked) | (Booked, Completed) | (Searching, Cancelled) | (Booked, Cancelled)
    )
  }

  /// Whether a dispute may be opened on an order in this status.
  pub fn allows_dispute(self) -> bool { matches!(self, Self::Booked | Self::Completed) }
}

/// Fail unless `order` may move to `next`.
pub fn check_transition(order: &Order, next: OrderStatus) -> Result<()> {
  if order.status.can_transition_to(next) {
    Ok(())
  } else {
    Err(Error::InvalidTransition { from: order.status, to: next })
  }
}

/// Fail unless `order` is accepting bids.
pub fn check_open(order: &Order) -> Result<()> {
  if order.status == OrderStatus::Searching {
    Ok(())
  } else {
    Err(Error::OrderNotOpen { order_id: order.order_id, status: order.status })
  }
}

/// Fail unless a dispute may be opened on `order`.
pub fn check_dispute(order: &Order) -> Result<()> {
  if !order.status.allows_dispute() {
    return Err(Error::NotDisputable { order_id: order.order_id, status: order.status });
  }
  if order.is_disputed {
    return Err(Error::AlreadyDisputed(order.order_id));
  }
  Ok(())
}

/// Fail unless `order` has an open dispute and `outcome` (if any) is a legal
/// move from its current status.
pub fn check_resolution(order: &Order, outcome: Option<OrderStatus>) -> Result<()> {
  if !order.is_disputed {
    return Err(Error::NotDisputed(order.order_id));
  }
  match outcome {
    Some(next) if next != order.status => check_transition(order, next),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn order(status: OrderStatus) -> Order {
    Order {
      order_id: Uuid::new_v4(),
      client_id: Uuid::new_v4(),
      title: "Упаковка 500 единиц".into(),
      description: String::new(),
      status,
      accepted_packer_id: None,
      is_disputed: false,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn legal_edges() {
    use OrderStatus::*;
    assert!(Searching.can_transition_to(Booked));
    assert!(Booked.can_transition_to(Completed));
    assert!(Searching.can_transition_to(Cancelled));
    assert!(Booked.can_transition_to(Cancelled));
  }

  #[test]
  fn terminal_statuses_have_no_exits() {
    use OrderStatus::*;
    for from in [Completed, Cancelled] {
      assert!(from.is_terminal());
      for to in [Searching, Booked, Completed, Cancelled] {
        assert!(!from.can_transition_to(to), "{from} -> {to}");
      }
    }
  }

  #[test]
  fn searching_cannot_skip_to_completed() {
    let err = check_transition(&order(OrderStatus::Searching), OrderStatus::Completed)
      .unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { from: OrderStatus::Searching, to: OrderStatus::Completed }
    ));
  }

  #[test]
  fn only_searching_orders_are_open() {
    assert!(check_open(&order(OrderStatus::Searching)).is_ok());
    assert!(matches!(
      check_open(&order(OrderStatus::Booked)),
      Err(Error::OrderNotOpen { status: OrderStatus::Booked, .. })
    ));
  }

  #[test]
  fn disputes_require_booked_or_completed() {
    assert!(check_dispute(&order(OrderStatus::Booked)).is_ok());
    assert!(check_dispute(&order(OrderStatus::Completed)).is_ok());
    assert!(matches!(
      check_dispute(&order(OrderStatus::Searching)),
      Err(Error::NotDisputable { .. })
    ));

    let mut disputed = order(OrderStatus::Booked);
    disputed.is_disputed = true;
    assert!(matches!(check_dispute(&disputed), Err(Error::AlreadyDisputed(_))));
  }

  #[test]
  fn resolution_checks_flag_and_outcome() {
    let mut o = order(OrderStatus::Booked);
    assert!(matches!(check_resolution(&o, None), Err(Error::NotDisputed(_))));

    o.is_disputed = true;
    assert!(check_resolution(&o, None).is_ok());
    assert!(check_resolution(&o, Some(OrderStatus::Completed)).is_ok());
    assert!(check_resolution(&o, Some(OrderStatus::Booked)).is_ok());
    assert!(matches!(
      check_resolution(&o, Some(OrderStatus::Searching)),
      Err(Error::InvalidTransition { .. })
    ));
  }
}
