//! [`MarketStore`] for [`SupabaseStore`].
//!
//! Single-row status changes are `PATCH`es filtered on the state the
//! lifecycle check was made against. If another writer got there first the
//! filter matches nothing; the order is then re-read and the check repeated,
//! so the caller sees the same error it would have seen had it arrived
//! second. Bid acceptance touches several rows and runs as the `accept_bid`
//! database function.

use chrono::{DateTime, SecondsFormat, Utc};
use depot_core::{
  Error as CoreError, lifecycle,
  market::{
    AcceptedBid, Bid, BidStatus, Message, NewBid, NewMessage, NewOrder, NewProfile, Order,
    OrderQuery, OrderStatus, Profile, UserRole,
  },
  store::MarketStore,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  Error, Result, SupabaseStore,
  store::{Filters, eq},
};

/// Guarded updates retried after losing a race before giving up.
const MAX_ATTEMPTS: usize = 3;

impl SupabaseStore {
  async fn require_order(&self, id: Uuid) -> Result<Order> {
    Ok(self.fetch_order(id).await?.ok_or(CoreError::OrderNotFound(id))?)
  }

  async fn require_profile(&self, id: Uuid) -> Result<Profile> {
    Ok(self.fetch_profile(id).await?.ok_or(CoreError::ProfileNotFound(id))?)
  }

  async fn require_bid(&self, id: Uuid) -> Result<Bid> {
    Ok(self.fetch_bid(id).await?.ok_or(CoreError::BidNotFound(id))?)
  }

  /// Read the order, run `check` on it, then write `patch(&order)` only if
  /// the row still has the status and dispute flag that were checked.
  async fn update_order<C, P>(&self, id: Uuid, check: C, patch: P) -> Result<Order>
  where
    C: Fn(&Order) -> depot_core::Result<()>,
    P: Fn(&Order) -> Value,
  {
    for _ in 0..MAX_ATTEMPTS {
      let order = self.require_order(id).await?;
      check(&order)?;

      let mut body = patch(&order);
      body["updated_at"] = json!(Utc::now());
      let filters: Filters = vec![
        ("order_id", eq(id)),
        ("status", eq(order.status)),
        ("is_disputed", format!("is.{}", order.is_disputed)),
      ];
      let rows: Vec<Order> = self.update("orders", filters, &body).await?;
      if let Some(updated) = rows.into_iter().next() {
        return Ok(updated);
      }
      tracing::debug!(order_id = %id, "guarded order update lost a race, retrying");
    }
    Err(Error::Contended(id))
  }
}

fn check_acceptable(order: &Order, bid: &Bid) -> depot_core::Result<()> {
  lifecycle::check_open(order)?;
  if bid.status != BidStatus::Pending {
    return Err(CoreError::BidNotPending(bid.bid_id));
  }
  Ok(())
}

impl MarketStore for SupabaseStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
    self
      .insert(
        "profiles",
        &json!({
          "profile_id": Uuid::new_v4(),
          "role": input.role,
          "display_name": input.display_name,
          "is_banned": false,
        }),
      )
      .await
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self.fetch_profile(id).await
  }

  async fn list_profiles(&self, role: Option<UserRole>) -> Result<Vec<Profile>> {
    let mut filters: Filters = vec![("order", "created_at.asc".to_owned())];
    if let Some(role) = role {
      filters.push(("role", eq(role)));
    }
    self.select("profiles", filters).await
  }

  async fn set_banned(&self, id: Uuid, banned: bool) -> Result<Profile> {
    let rows: Vec<Profile> = self
      .update("profiles", vec![("profile_id", eq(id))], &json!({ "is_banned": banned }))
      .await?;
    Ok(rows.into_iter().next().ok_or(CoreError::ProfileNotFound(id))?)
  }

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn create_order(&self, input: NewOrder) -> Result<Order> {
    self.require_profile(input.client_id).await?;
    self
      .insert(
        "orders",
        &json!({
          "order_id": Uuid::new_v4(),
          "client_id": input.client_id,
          "title": input.title,
          "description": input.description,
          "status": OrderStatus::Searching,
          "is_disputed": false,
        }),
      )
      .await
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    self.fetch_order(id).await
  }

  async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
    let mut filters: Filters = vec![("order", "created_at.desc".to_owned())];
    if let Some(status) = query.status {
      filters.push(("status", eq(status)));
    }
    if let Some(client_id) = query.client_id {
      filters.push(("client_id", eq(client_id)));
    }
    if let Some(packer_id) = query.packer_id {
      filters.push(("accepted_packer_id", eq(packer_id)));
    }
    self.select("orders", filters).await
  }

  async fn transition_order(&self, id: Uuid, next: OrderStatus) -> Result<Order> {
    if next == OrderStatus::Booked {
      // Booking needs a winning bid; see `accept_bid`.
      let current = self.require_order(id).await?;
      return Err(CoreError::InvalidTransition { from: current.status, to: next }.into());
    }
    self
      .update_order(
        id,
        |order| lifecycle::check_transition(order, next),
        |_| json!({ "status": next }),
      )
      .await
  }

  async fn open_dispute(&self, id: Uuid) -> Result<Order> {
    self
      .update_order(id, lifecycle::check_dispute, |_| json!({ "is_disputed": true }))
      .await
  }

  async fn resolve_dispute(&self, id: Uuid, outcome: Option<OrderStatus>) -> Result<Order> {
    self
      .update_order(
        id,
        |order| lifecycle::check_resolution(order, outcome),
        |order| {
          json!({
            "is_disputed": false,
            "status": outcome.unwrap_or(order.status),
          })
        },
      )
      .await
  }

  // ── Bids ──────────────────────────────────────────────────────────────────

  async fn place_bid(&self, input: NewBid) -> Result<Bid> {
    input.validate()?;
    let order = self.require_order(input.order_id).await?;
    lifecycle::check_open(&order)?;
    self.require_profile(input.packer_id).await?;

    self
      .insert(
        "bids",
        &json!({
          "bid_id": Uuid::new_v4(),
          "order_id": input.order_id,
          "packer_id": input.packer_id,
          "price": input.price,
          "days": input.days,
          "comment": input.comment,
          "status": BidStatus::Pending,
        }),
      )
      .await
  }

  async fn get_bid(&self, id: Uuid) -> Result<Option<Bid>> {
    self.fetch_bid(id).await
  }

  async fn list_bids(&self, order_id: Uuid) -> Result<Vec<Bid>> {
    self
      .select(
        "bids",
        vec![("order_id", eq(order_id)), ("order", "created_at.asc".to_owned())],
      )
      .await
  }

  async fn reject_bid(&self, id: Uuid) -> Result<Bid> {
    let bid = self.require_bid(id).await?;
    if bid.status != BidStatus::Pending {
      return Err(CoreError::BidNotPending(id).into());
    }
    let rows: Vec<Bid> = self
      .update(
        "bids",
        vec![("bid_id", eq(id)), ("status", eq(BidStatus::Pending))],
        &json!({ "status": BidStatus::Rejected }),
      )
      .await?;
    // An empty result means the bid left `pending` after it was read.
    Ok(rows.into_iter().next().ok_or(CoreError::BidNotPending(id))?)
  }

  async fn accept_bid(&self, id: Uuid) -> Result<AcceptedBid> {
    let bid = self.require_bid(id).await?;
    let order = self.require_order(bid.order_id).await?;
    check_acceptable(&order, &bid)?;

    let accepted: Option<AcceptedBid> = self
      .rpc("accept_bid", &json!({ "p_bid_id": id }))
      .await?;

    let Some(accepted) = accepted else {
      // The function's guard refused; report why from the current state.
      let bid = self.require_bid(id).await?;
      let order = self.require_order(bid.order_id).await?;
      check_acceptable(&order, &bid)?;
      return Err(CoreError::OrderNotOpen { order_id: order.order_id, status: order.status }.into());
    };

    tracing::info!(
      order_id = %accepted.order.order_id,
      bid_id = %accepted.bid.bid_id,
      packer_id = %accepted.bid.packer_id,
      "bid accepted"
    );
    Ok(accepted)
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn post_message(&self, input: NewMessage) -> Result<Message> {
    if input.content.trim().is_empty() {
      return Err(CoreError::InvalidInput("message content is empty".into()).into());
    }
    self.require_order(input.order_id).await?;

    self
      .insert(
        "messages",
        &json!({
          "message_id": Uuid::new_v4(),
          "order_id": input.order_id,
          "sender_id": input.sender_id,
          "packer_id": input.packer_id,
          "content": input.content,
          "is_system": input.is_system,
        }),
      )
      .await
  }

  async fn list_messages(
    &self,
    order_id: Uuid,
    packer_id: Option<Uuid>,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<Message>> {
    let mut filters: Filters = vec![
      ("order_id", eq(order_id)),
      ("order", "created_at.asc".to_owned()),
    ];
    if let Some(packer_id) = packer_id {
      filters.push(("or", format!("(packer_id.eq.{packer_id},is_system.is.true)")));
    }
    if let Some(since) = since {
      filters.push((
        "created_at",
        format!("gt.{}", since.to_rfc3339_opts(SecondsFormat::Micros, true)),
      ));
    }
    self.select("messages", filters).await
  }
}
