//! [`SqliteStore`]: connection handling and shared row lookups.
//!
//! The trait implementations live in `knowledge.rs` and `market.rs`.

use std::path::Path;

use depot_core::market::{Bid, Order, Profile};
use rusqlite::{Connection, OptionalExtension as _, Transaction};

use crate::{
  Result,
  encode::{
    BID_COLUMNS, ORDER_COLUMNS, PROFILE_COLUMNS, RawBid, RawOrder, RawProfile,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Depot store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    tracing::debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .with_conn(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `f` on the database thread.
  pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside a transaction that commits only if `f` succeeds.
  pub(crate) async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }
}

// ─── Shared lookups ──────────────────────────────────────────────────────────

pub(crate) fn fetch_profile(conn: &Connection, id: &str) -> Result<Option<Profile>> {
  conn
    .query_row(
      &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
      rusqlite::params![id],
      RawProfile::from_row,
    )
    .optional()?
    .map(RawProfile::into_profile)
    .transpose()
}

pub(crate) fn fetch_order(conn: &Connection, id: &str) -> Result<Option<Order>> {
  conn
    .query_row(
      &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"),
      rusqlite::params![id],
      RawOrder::from_row,
    )
    .optional()?
    .map(RawOrder::into_order)
    .transpose()
}

pub(crate) fn fetch_bid(conn: &Connection, id: &str) -> Result<Option<Bid>> {
  conn
    .query_row(
      &format!("SELECT {BID_COLUMNS} FROM bids WHERE bid_id = ?1"),
      rusqlite::params![id],
      RawBid::from_row,
    )
    .optional()?
    .map(RawBid::into_bid)
    .transpose()
}
