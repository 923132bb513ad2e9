//! Marketplace records: profiles, orders, bids and order-scoped messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Profiles ────────────────────────────────────────────────────────────────

/// The role a profile plays on the marketplace.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
  Admin,
  Manager,
  Packer,
  Client,
}

impl UserRole {
  /// Admins and managers arbitrate disputes.
  pub fn can_arbitrate(self) -> bool { matches!(self, Self::Admin | Self::Manager) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id:   Uuid,
  pub role:         UserRole,
  pub display_name: String,
  pub is_banned:    bool,
  pub created_at:   DateTime<Utc>,
}

impl Profile {
  /// Fail unless the profile has `role` and is not banned.
  pub fn ensure_active_as(&self, role: UserRole) -> Result<()> {
    if self.role != role {
      return Err(Error::RoleMismatch { profile_id: self.profile_id, expected: role });
    }
    self.ensure_not_banned()
  }

  pub fn ensure_not_banned(&self) -> Result<()> {
    if self.is_banned { Err(Error::Banned(self.profile_id)) } else { Ok(()) }
  }
}

/// Input to [`crate::store::MarketStore::create_profile`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
  pub role:         UserRole,
  pub display_name: String,
}

// ─── Orders ──────────────────────────────────────────────────────────────────

/// Where an order is in its lifecycle. See [`crate::lifecycle`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
  Searching,
  Booked,
  Completed,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub order_id:           Uuid,
  pub client_id:          Uuid,
  pub title:              String,
  pub description:        String,
  pub status:             OrderStatus,
  /// Set when a bid is accepted.
  pub accepted_packer_id: Option<Uuid>,
  pub is_disputed:        bool,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
  pub client_id:   Uuid,
  pub title:       String,
  #[serde(default)]
  pub description: String,
}

/// Filters for [`crate::store::MarketStore::list_orders`]. Every set field
/// must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
  pub status:    Option<OrderStatus>,
  pub client_id: Option<Uuid>,
  /// Orders booked by this packer.
  pub packer_id: Option<Uuid>,
}

// ─── Bids ────────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BidStatus {
  Pending,
  Accepted,
  Rejected,
}

/// A packer's price/lead-time offer against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
  pub bid_id:     Uuid,
  pub order_id:   Uuid,
  pub packer_id:  Uuid,
  /// Whole roubles.
  pub price:      i64,
  pub days:       u32,
  pub comment:    Option<String>,
  pub status:     BidStatus,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBid {
  pub order_id:  Uuid,
  pub packer_id: Uuid,
  pub price:     i64,
  pub days:      u32,
  #[serde(default)]
  pub comment:   Option<String>,
}

impl NewBid {
  pub fn validate(&self) -> Result<()> {
    if self.price <= 0 {
      return Err(Error::InvalidInput("price must be positive".into()));
    }
    if self.days == 0 {
      return Err(Error::InvalidInput("days must be positive".into()));
    }
    Ok(())
  }
}

/// The result of accepting a bid: the booked order and the winning bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedBid {
  pub order: Order,
  pub bid:   Bid,
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// A chat message scoped to an order.
///
/// Before booking, the client talks to each bidding packer in a separate
/// thread identified by `packer_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub message_id: Uuid,
  pub order_id:   Uuid,
  /// `None` for system-generated messages.
  pub sender_id:  Option<Uuid>,
  pub packer_id:  Option<Uuid>,
  pub content:    String,
  pub is_system:  bool,
  pub created_at: DateTime<Utc>,
}

impl Message {
  /// Whether this message belongs to the stream a viewer subscribed to.
  /// System notices belong to every packer thread of their order.
  pub fn matches(&self, order_id: Uuid, packer_id: Option<Uuid>) -> bool {
    self.order_id == order_id
      && match packer_id {
        Some(p) => self.is_system || self.packer_id == Some(p),
        None => true,
      }
  }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
  pub order_id:  Uuid,
  pub sender_id: Option<Uuid>,
  pub packer_id: Option<Uuid>,
  pub content:   String,
  pub is_system: bool,
}

impl NewMessage {
  /// A message authored by the platform rather than a participant.
  pub fn system(order_id: Uuid, content: impl Into<String>) -> Self {
    Self {
      order_id,
      sender_id: None,
      packer_id: None,
      content: content.into(),
      is_system: true,
    }
  }
}

/// An ordered list of messages that ignores repeated deliveries of the same
/// message id.
#[derive(Debug, Clone, Default)]
pub struct MessageFeed {
  messages: Vec<Message>,
}

impl MessageFeed {
  pub fn new() -> Self { Self::default() }

  /// Add `message` unless a message with the same id is already present.
  /// Returns `true` if it was added.
  pub fn insert(&mut self, message: Message) -> bool {
    if self.messages.iter().any(|m| m.message_id == message.message_id) {
      return false;
    }
    let at = self
      .messages
      .partition_point(|m| m.created_at <= message.created_at);
    self.messages.insert(at, message);
    true
  }

  pub fn is_empty(&self) -> bool { self.messages.is_empty() }

  pub fn len(&self) -> usize { self.messages.len() }

  pub fn into_vec(self) -> Vec<Message> { self.messages }
}

impl Extend<Message> for MessageFeed {
  fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
    for message in iter {
      self.insert(message);
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn message(order_id: Uuid, packer_id: Option<Uuid>, offset_secs: i64) -> Message {
    Message {
      message_id: Uuid::new_v4(),
      order_id,
      sender_id: None,
      packer_id,
      content: "hi".into(),
      is_system: false,
      created_at: Utc::now() + Duration::seconds(offset_secs),
    }
  }

  #[test]
  fn feed_drops_duplicate_ids_and_keeps_order() {
    let order = Uuid::new_v4();
    let first = message(order, None, 0);
    let second = message(order, None, 5);

    let mut feed = MessageFeed::new();
    assert!(feed.insert(second.clone()));
    assert!(feed.insert(first.clone()));
    assert!(!feed.insert(second.clone()));
    assert_eq!(feed.len(), 2);

    let ids: Vec<_> = feed.into_vec().into_iter().map(|m| m.message_id).collect();
    assert_eq!(ids, vec![first.message_id, second.message_id]);
  }

  #[test]
  fn message_matches_packer_thread() {
    let order = Uuid::new_v4();
    let packer = Uuid::new_v4();
    let msg = message(order, Some(packer), 0);

    assert!(msg.matches(order, None));
    assert!(msg.matches(order, Some(packer)));
    assert!(!msg.matches(order, Some(Uuid::new_v4())));
    assert!(!msg.matches(Uuid::new_v4(), None));
  }

  #[test]
  fn system_message_matches_every_packer_thread() {
    let order = Uuid::new_v4();
    let mut notice = message(order, None, 0);
    notice.is_system = true;

    assert!(notice.matches(order, Some(Uuid::new_v4())));
    assert!(notice.matches(order, None));
    assert!(!notice.matches(Uuid::new_v4(), Some(Uuid::new_v4())));
    assert!(!message(order, None, 0).matches(order, Some(Uuid::new_v4())));
  }

  #[test]
  fn statuses_round_trip_through_strum() {
    assert_eq!(OrderStatus::Searching.as_ref(), "searching");
    assert_eq!("cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
    assert_eq!(BidStatus::Accepted.to_string(), "accepted");
    assert!("unknown".parse::<UserRole>().is_err());
  }

  #[test]
  fn bid_validation_rejects_non_positive_values() {
    let mut bid = NewBid {
      order_id:  Uuid::new_v4(),
      packer_id: Uuid::new_v4(),
      price:     1500,
      days:      3,
      comment:   None,
    };
    assert!(bid.validate().is_ok());
    bid.price = 0;
    assert!(matches!(bid.validate(), Err(Error::InvalidInput(_))));
    bid.price = 10;
    bid.days = 0;
    assert!(matches!(bid.validate(), Err(Error::InvalidInput(_))));
  }

  #[test]
  fn banned_or_wrong_role_profiles_are_refused() {
    let mut profile = Profile {
      profile_id:   Uuid::new_v4(),
      role:         UserRole::Packer,
      display_name: "Склад на Лиговском".into(),
      is_banned:    false,
      created_at:   Utc::now(),
    };
    assert!(profile.ensure_active_as(UserRole::Packer).is_ok());
    assert!(matches!(
      profile.ensure_active_as(UserRole::Client),
      Err(Error::RoleMismatch { .. })
    ));
    profile.is_banned = true;
    assert!(matches!(profile.ensure_active_as(UserRole::Packer), Err(Error::Banned(_))));
  }
}
