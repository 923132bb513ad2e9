//! Storage traits.
//!
//! Implemented by backends (`depot-store-sqlite`, `depot-store-supabase`).
//! The HTTP layer and the ingestion pipeline depend on these abstractions,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  DomainError,
  document::{ImageCaption, MatchedPassage, NewPassage, Passage},
  market::{
    AcceptedBid, Bid, Message, NewBid, NewMessage, NewOrder, NewProfile, Order,
    OrderQuery, OrderStatus, Profile, UserRole,
  },
};

// ─── Knowledge base ──────────────────────────────────────────────────────────

/// The documents table and the caption table.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait KnowledgeStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Passages ──────────────────────────────────────────────────────────

  /// Persist a passage with its embedding.
  fn insert_passage(
    &self,
    input: NewPassage,
  ) -> impl Future<Output = Result<Passage, Self::Error>> + Send + '_;

  /// Whether a passage with this content hash already exists.
  fn has_passage_hash<'a>(
    &'a self,
    content_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete every passage whose metadata title equals `title`. Returns the
  /// number of rows removed.
  fn delete_passages_by_title<'a>(
    &'a self,
    title: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// The `match_documents` search: passages whose cosine similarity to
  /// `query_embedding` is at least `threshold`, most similar first, at most
  /// `count` of them.
  fn match_documents(
    &self,
    query_embedding: Vec<f32>,
    threshold: f32,
    count: usize,
  ) -> impl Future<Output = Result<Vec<MatchedPassage>, Self::Error>> + Send + '_;

  /// Page through passages, newest first.
  fn list_passages(
    &self,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<Passage>, Self::Error>> + Send + '_;

  // ── Captions ──────────────────────────────────────────────────────────

  /// Insert or replace the caption for `url`.
  fn upsert_caption(
    &self,
    url: String,
    description: String,
  ) -> impl Future<Output = Result<ImageCaption, Self::Error>> + Send + '_;

  fn get_caption<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Option<ImageCaption>, Self::Error>> + Send + 'a;

  fn list_captions(
    &self,
  ) -> impl Future<Output = Result<Vec<ImageCaption>, Self::Error>> + Send + '_;

  /// Returns `false` if there was no caption for `url`.
  fn delete_caption<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Marketplace ─────────────────────────────────────────────────────────────

/// Profiles, orders, bids and messages.
///
/// Every state change that touches more than one row is performed
/// indivisibly by the backend, guarded on the order's current status.
pub trait MarketStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn create_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn list_profiles(
    &self,
    role: Option<UserRole>,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Set or clear the ban flag.
  fn set_banned(
    &self,
    id: Uuid,
    banned: bool,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  // ── Orders ────────────────────────────────────────────────────────────

  /// Create an order in `searching` status.
  fn create_order(
    &self,
    input: NewOrder,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  fn get_order(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  /// Orders matching `query`, newest first.
  fn list_orders<'a>(
    &'a self,
    query: &'a OrderQuery,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  /// Move an order along the state machine (complete or cancel). Booking
  /// happens only through [`MarketStore::accept_bid`].
  fn transition_order(
    &self,
    id: Uuid,
    next: OrderStatus,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  /// Raise the dispute flag on a `booked` or `completed` order.
  fn open_dispute(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  /// Clear the dispute flag and, if `outcome` is given, move the order to
  /// that status in the same step.
  fn resolve_dispute(
    &self,
    id: Uuid,
    outcome: Option<OrderStatus>,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  // ── Bids ──────────────────────────────────────────────────────────────

  /// Place a pending bid. The order must be `searching`.
  fn place_bid(
    &self,
    input: NewBid,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + '_;

  fn get_bid(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Bid>, Self::Error>> + Send + '_;

  /// All bids for an order, oldest first.
  fn list_bids(
    &self,
    order_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send + '_;

  /// Reject a single pending bid.
  fn reject_bid(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + '_;

  /// Accept a bid: book the order for the bid's packer, mark the bid
  /// accepted and every sibling bid rejected. All or nothing; fails if the
  /// order is no longer `searching`.
  fn accept_bid(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<AcceptedBid, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  fn post_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages for an order in chronological order, restricted to one
  /// packer thread when `packer_id` is set and to messages created after
  /// `since` when it is set.
  fn list_messages(
    &self,
    order_id: Uuid,
    packer_id: Option<Uuid>,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;
}
