//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with fixed microsecond precision and a `Z`
//! suffix, so lexical order equals chronological order. UUIDs are
//! hyphenated lowercase strings. Enumerations use their lowercase names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use depot_core::{
  document::{ImageCaption, Passage, PassageMetadata},
  market::{Bid, Message, Order, Profile},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

/// Parse a lowercase enum name written by `AsRef<str>`.
pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| {
    Error::from(depot_core::Error::UnknownVariant { kind, value: s.to_owned() })
  })
}

// ─── Embeddings ───────────────────────────────────────────────────────────────

pub fn vec_to_blob(v: &[f32]) -> Vec<u8> {
  v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>> {
  if blob.len() % 4 != 0 {
    return Err(Error::CorruptEmbedding(blob.len()));
  }
  Ok(
    blob
      .chunks_exact(4)
      .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
      .collect(),
  )
}

// ─── Row types ────────────────────────────────────────────────────────────────

pub const PASSAGE_COLUMNS: &str = "passage_id, content, metadata, content_hash, created_at";

/// Raw strings read directly from a `documents` row.
pub struct RawPassage {
  pub passage_id:   String,
  pub content:      String,
  pub metadata:     String,
  pub content_hash: String,
  pub created_at:   String,
}

impl RawPassage {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      passage_id:   row.get(0)?,
      content:      row.get(1)?,
      metadata:     row.get(2)?,
      content_hash: row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_passage(self) -> Result<Passage> {
    let metadata: PassageMetadata = serde_json::from_str(&self.metadata)?;
    Ok(Passage {
      passage_id: decode_uuid(&self.passage_id)?,
      content: self.content,
      metadata,
      content_hash: self.content_hash,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawCaption {
  pub url:         String,
  pub description: String,
  pub updated_at:  String,
}

impl RawCaption {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      url:         row.get(0)?,
      description: row.get(1)?,
      updated_at:  row.get(2)?,
    })
  }

  pub fn into_caption(self) -> Result<ImageCaption> {
    Ok(ImageCaption {
      url:         self.url,
      description: self.description,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const PROFILE_COLUMNS: &str = "profile_id, role, display_name, is_banned, created_at";

pub struct RawProfile {
  pub profile_id:   String,
  pub role:         String,
  pub display_name: String,
  pub is_banned:    bool,
  pub created_at:   String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:   row.get(0)?,
      role:         row.get(1)?,
      display_name: row.get(2)?,
      is_banned:    row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id:   decode_uuid(&self.profile_id)?,
      role:         decode_enum("role", &self.role)?,
      display_name: self.display_name,
      is_banned:    self.is_banned,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const ORDER_COLUMNS: &str = "order_id, client_id, title, description, status, \
  accepted_packer_id, is_disputed, created_at, updated_at";

pub struct RawOrder {
  pub order_id:           String,
  pub client_id:          String,
  pub title:              String,
  pub description:        String,
  pub status:             String,
  pub accepted_packer_id: Option<String>,
  pub is_disputed:        bool,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawOrder {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:           row.get(0)?,
      client_id:          row.get(1)?,
      title:              row.get(2)?,
      description:        row.get(3)?,
      status:             row.get(4)?,
      accepted_packer_id: row.get(5)?,
      is_disputed:        row.get(6)?,
      created_at:         row.get(7)?,
      updated_at:         row.get(8)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:           decode_uuid(&self.order_id)?,
      client_id:          decode_uuid(&self.client_id)?,
      title:              self.title,
      description:        self.description,
      status:             decode_enum("order status", &self.status)?,
      accepted_packer_id: decode_opt_uuid(self.accepted_packer_id)?,
      is_disputed:        self.is_disputed,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

pub const BID_COLUMNS: &str =
  "bid_id, order_id, packer_id, price, days, comment, status, created_at";

pub struct RawBid {
  pub bid_id:     String,
  pub order_id:   String,
  pub packer_id:  String,
  pub price:      i64,
  pub days:       u32,
  pub comment:    Option<String>,
  pub status:     String,
  pub created_at: String,
}

impl RawBid {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bid_id:     row.get(0)?,
      order_id:   row.get(1)?,
      packer_id:  row.get(2)?,
      price:      row.get(3)?,
      days:       row.get(4)?,
      comment:    row.get(5)?,
      status:     row.get(6)?,
      created_at: row.get(7)?,
    })
  }

  pub fn into_bid(self) -> Result<Bid> {
    Ok(Bid {
      bid_id:     decode_uuid(&self.bid_id)?,
      order_id:   decode_uuid(&self.order_id)?,
      packer_id:  decode_uuid(&self.packer_id)?,
      price:      self.price,
      days:       self.days,
      comment:    self.comment,
      status:     decode_enum("bid status", &self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "message_id, order_id, sender_id, packer_id, content, is_system, created_at";

pub struct RawMessage {
  pub message_id: String,
  pub order_id:   String,
  pub sender_id:  Option<String>,
  pub packer_id:  Option<String>,
  pub content:    String,
  pub is_system:  bool,
  pub created_at: String,
}

impl RawMessage {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      order_id:   row.get(1)?,
      sender_id:  row.get(2)?,
      packer_id:  row.get(3)?,
      content:    row.get(4)?,
      is_system:  row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id: decode_uuid(&self.message_id)?,
      order_id:   decode_uuid(&self.order_id)?,
      sender_id:  decode_opt_uuid(self.sender_id)?,
      packer_id:  decode_opt_uuid(self.packer_id)?,
      content:    self.content,
      is_system:  self.is_system,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedding_blob_round_trip() {
    let v = vec![0.25f32, -1.5, 3.0e-3];
    assert_eq!(blob_to_vec(&vec_to_blob(&v)).unwrap(), v);
  }

  #[test]
  fn truncated_blob_is_rejected() {
    assert!(matches!(blob_to_vec(&[0, 1, 2]), Err(Error::CorruptEmbedding(3))));
  }

  #[test]
  fn timestamps_sort_lexically() {
    let a = decode_dt("2026-01-01T10:00:00Z").unwrap();
    let b = decode_dt("2026-01-01T10:00:00.5Z").unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(encode_dt(a), "2026-01-01T10:00:00.000000Z");
  }

  #[test]
  fn unknown_enum_value_is_a_core_error() {
    let err = decode_enum::<depot_core::market::OrderStatus>("order status", "lost").unwrap_err();
    assert!(matches!(
      err,
      Error::Core(depot_core::Error::UnknownVariant { kind: "order status", .. })
    ));
  }
}
