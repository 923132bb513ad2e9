//! [`MarketStore`] for [`SqliteStore`].
//!
//! Every write that depends on an order's current status re-reads the order
//! and applies the lifecycle check inside the same transaction.

use chrono::{DateTime, Utc};
use depot_core::{
  Error as CoreError, lifecycle,
  market::{
    AcceptedBid, Bid, BidStatus, Message, NewBid, NewMessage, NewOrder, NewProfile, Order,
    OrderQuery, OrderStatus, Profile, UserRole,
  },
  store::MarketStore,
};
use rusqlite::{Connection, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    BID_COLUMNS, MESSAGE_COLUMNS, ORDER_COLUMNS, PROFILE_COLUMNS, RawBid, RawMessage, RawOrder,
    RawProfile, encode_dt, encode_uuid, now,
  },
  store::{fetch_bid, fetch_order, fetch_profile},
};

fn require_order(conn: &Connection, id: Uuid) -> Result<Order> {
  fetch_order(conn, &encode_uuid(id))?.ok_or_else(|| CoreError::OrderNotFound(id).into())
}

fn require_profile(conn: &Connection, id: Uuid) -> Result<Profile> {
  fetch_profile(conn, &encode_uuid(id))?.ok_or_else(|| CoreError::ProfileNotFound(id).into())
}

fn require_bid(conn: &Connection, id: Uuid) -> Result<Bid> {
  fetch_bid(conn, &encode_uuid(id))?.ok_or_else(|| CoreError::BidNotFound(id).into())
}

impl MarketStore for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      profile_id:   Uuid::new_v4(),
      role:         input.role,
      display_name: input.display_name,
      is_banned:    false,
      created_at:   now(),
    };

    let id_str   = encode_uuid(profile.profile_id);
    let role_str = profile.role.as_ref().to_owned();
    let name     = profile.display_name.clone();
    let at_str   = encode_dt(profile.created_at);

    self
      .with_conn(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_id, role, display_name, is_banned, created_at)
           VALUES (?1, ?2, ?3, 0, ?4)",
          rusqlite::params![id_str, role_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self.with_conn(move |conn| fetch_profile(conn, &encode_uuid(id))).await
  }

  async fn list_profiles(&self, role: Option<UserRole>) -> Result<Vec<Profile>> {
    let role_str = role.map(|r| r.as_ref().to_owned());

    let raws: Vec<RawProfile> = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles
           WHERE ?1 IS NULL OR role = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn set_banned(&self, id: Uuid, banned: bool) -> Result<Profile> {
    self
      .transact(move |tx| {
        let changed = tx.execute(
          "UPDATE profiles SET is_banned = ?1 WHERE profile_id = ?2",
          rusqlite::params![banned, encode_uuid(id)],
        )?;
        if changed == 0 {
          return Err(CoreError::ProfileNotFound(id).into());
        }
        require_profile(tx, id)
      })
      .await
  }

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn create_order(&self, input: NewOrder) -> Result<Order> {
    let at = now();
    let order = Order {
      order_id:           Uuid::new_v4(),
      client_id:          input.client_id,
      title:              input.title,
      description:        input.description,
      status:             OrderStatus::Searching,
      accepted_packer_id: None,
      is_disputed:        false,
      created_at:         at,
      updated_at:         at,
    };

    let id_str      = encode_uuid(order.order_id);
    let client_id   = order.client_id;
    let title       = order.title.clone();
    let description = order.description.clone();
    let at_str      = encode_dt(at);

    self
      .transact(move |tx| {
        require_profile(tx, client_id)?;
        tx.execute(
          "INSERT INTO orders
             (order_id, client_id, title, description, status, is_disputed, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, 'searching', 0, ?5, ?5)",
          rusqlite::params![id_str, encode_uuid(client_id), title, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    self.with_conn(move |conn| fetch_order(conn, &encode_uuid(id))).await
  }

  async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
    let mut conds: Vec<&'static str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    if let Some(status) = query.status {
      conds.push("status = ?");
      params.push(Value::Text(status.as_ref().to_owned()));
    }
    if let Some(client_id) = query.client_id {
      conds.push("client_id = ?");
      params.push(Value::Text(encode_uuid(client_id)));
    }
    if let Some(packer_id) = query.packer_id {
      conds.push("accepted_packer_id = ?");
      params.push(Value::Text(encode_uuid(packer_id)));
    }
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let raws: Vec<RawOrder> = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ORDER_COLUMNS} FROM orders {where_clause} ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }

  async fn transition_order(&self, id: Uuid, next: OrderStatus) -> Result<Order> {
    if next == OrderStatus::Booked {
      // Booking needs a winning bid; see `accept_bid`.
      let current = self
        .get_order(id)
        .await?
        .ok_or(CoreError::OrderNotFound(id))?;
      return Err(CoreError::InvalidTransition { from: current.status, to: next }.into());
    }

    self
      .transact(move |tx| {
        let order = require_order(tx, id)?;
        lifecycle::check_transition(&order, next)?;
        tx.execute(
          "UPDATE orders SET status = ?1, updated_at = ?2 WHERE order_id = ?3",
          rusqlite::params![next.as_ref(), encode_dt(now()), encode_uuid(id)],
        )?;
        require_order(tx, id)
      })
      .await
  }

  async fn open_dispute(&self, id: Uuid) -> Result<Order> {
    self
      .transact(move |tx| {
        let order = require_order(tx, id)?;
        lifecycle::check_dispute(&order)?;
        tx.execute(
          "UPDATE orders SET is_disputed = 1, updated_at = ?1 WHERE order_id = ?2",
          rusqlite::params![encode_dt(now()), encode_uuid(id)],
        )?;
        require_order(tx, id)
      })
      .await
  }

  async fn resolve_dispute(&self, id: Uuid, outcome: Option<OrderStatus>) -> Result<Order> {
    self
      .transact(move |tx| {
        let order = require_order(tx, id)?;
        lifecycle::check_resolution(&order, outcome)?;
        let status = outcome.unwrap_or(order.status);
        tx.execute(
          "UPDATE orders SET is_disputed = 0, status = ?1, updated_at = ?2 WHERE order_id = ?3",
          rusqlite::params![status.as_ref(), encode_dt(now()), encode_uuid(id)],
        )?;
        require_order(tx, id)
      })
      .await
  }

  // ── Bids ──────────────────────────────────────────────────────────────────

  async fn place_bid(&self, input: NewBid) -> Result<Bid> {
    input.validate()?;

    let bid = Bid {
      bid_id:     Uuid::new_v4(),
      order_id:   input.order_id,
      packer_id:  input.packer_id,
      price:      input.price,
      days:       input.days,
      comment:    input.comment,
      status:     BidStatus::Pending,
      created_at: now(),
    };

    let row = bid.clone();
    self
      .transact(move |tx| {
        let order = require_order(tx, row.order_id)?;
        lifecycle::check_open(&order)?;
        require_profile(tx, row.packer_id)?;
        tx.execute(
          "INSERT INTO bids
             (bid_id, order_id, packer_id, price, days, comment, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7)",
          rusqlite::params![
            encode_uuid(row.bid_id),
            encode_uuid(row.order_id),
            encode_uuid(row.packer_id),
            row.price,
            row.days,
            row.comment,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(bid)
  }

  async fn get_bid(&self, id: Uuid) -> Result<Option<Bid>> {
    self.with_conn(move |conn| fetch_bid(conn, &encode_uuid(id))).await
  }

  async fn list_bids(&self, order_id: Uuid) -> Result<Vec<Bid>> {
    let order_str = encode_uuid(order_id);
    let raws: Vec<RawBid> = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BID_COLUMNS} FROM bids WHERE order_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![order_str], RawBid::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBid::into_bid).collect()
  }

  async fn reject_bid(&self, id: Uuid) -> Result<Bid> {
    self
      .transact(move |tx| {
        let bid = require_bid(tx, id)?;
        if bid.status != BidStatus::Pending {
          return Err(CoreError::BidNotPending(id).into());
        }
        tx.execute(
          "UPDATE bids SET status = 'rejected' WHERE bid_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        require_bid(tx, id)
      })
      .await
  }

  async fn accept_bid(&self, id: Uuid) -> Result<AcceptedBid> {
    let accepted = self
      .transact(move |tx| {
        let bid = require_bid(tx, id)?;
        let order = require_order(tx, bid.order_id)?;
        lifecycle::check_open(&order)?;
        if bid.status != BidStatus::Pending {
          return Err(CoreError::BidNotPending(id).into());
        }

        let order_str = encode_uuid(order.order_id);
        let bid_str = encode_uuid(id);
        tx.execute(
          "UPDATE orders
             SET status = 'booked', accepted_packer_id = ?1, updated_at = ?2
           WHERE order_id = ?3 AND status = 'searching'",
          rusqlite::params![encode_uuid(bid.packer_id), encode_dt(now()), order_str],
        )?;
        tx.execute(
          "UPDATE bids SET status = 'accepted' WHERE bid_id = ?1",
          rusqlite::params![bid_str],
        )?;
        tx.execute(
          "UPDATE bids SET status = 'rejected' WHERE order_id = ?1 AND bid_id != ?2",
          rusqlite::params![order_str, bid_str],
        )?;

        Ok(AcceptedBid {
          order: require_order(tx, order.order_id)?,
          bid:   require_bid(tx, id)?,
        })
      })
      .await?;

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

    let message = Message {
      message_id: Uuid::new_v4(),
      order_id:   input.order_id,
      sender_id:  input.sender_id,
      packer_id:  input.packer_id,
      content:    input.content,
      is_system:  input.is_system,
      created_at: now(),
    };

    let row = message.clone();
    self
      .transact(move |tx| {
        require_order(tx, row.order_id)?;
        tx.execute(
          "INSERT INTO messages
             (message_id, order_id, sender_id, packer_id, content, is_system, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(row.message_id),
            encode_uuid(row.order_id),
            row.sender_id.map(encode_uuid),
            row.packer_id.map(encode_uuid),
            row.content,
            row.is_system,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(message)
  }

  async fn list_messages(
    &self,
    order_id: Uuid,
    packer_id: Option<Uuid>,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<Message>> {
    let order_str  = encode_uuid(order_id);
    let packer_str = packer_id.map(encode_uuid);
    let since_str  = since.map(encode_dt);

    let raws: Vec<RawMessage> = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE order_id = ?1
             AND (?2 IS NULL OR packer_id = ?2 OR is_system = 1)
             AND (?3 IS NULL OR created_at > ?3)
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![order_str, packer_str, since_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }
}
