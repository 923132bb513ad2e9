//! [`SupabaseStore`]: PostgREST plumbing and shared row lookups.

use std::time::Duration;

use depot_core::market::{Bid, Order, Profile};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

/// Connection settings for a Supabase project.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
  /// Project URL, e.g. `https://xyzcompany.supabase.co`.
  pub url:          String,
  pub anon_key:     String,
  #[serde(default)]
  pub timeout_secs: Option<u64>,
}

/// A Depot store backed by a Supabase project.
///
/// Cloning is cheap; the HTTP client is reference-counted.
#[derive(Clone)]
pub struct SupabaseStore {
  client:   Client,
  rest_url: String,
  key:      String,
}

/// Query-string filters in PostgREST syntax, e.g. `("status", "eq.booked")`.
pub(crate) type Filters = Vec<(&'static str, String)>;

pub(crate) fn eq(value: impl std::fmt::Display) -> String { format!("eq.{value}") }

fn no_row(table: &str) -> Error {
  Error::Status {
    endpoint: table.to_owned(),
    status:   reqwest::StatusCode::NO_CONTENT,
    body:     "write returned no row".to_owned(),
  }
}

impl SupabaseStore {
  pub fn new(config: SupabaseConfig) -> Result<Self> {
    if config.url.is_empty() {
      return Err(Error::Config("supabase_url"));
    }
    if config.anon_key.is_empty() {
      return Err(Error::Config("supabase_anon_key"));
    }
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(Self {
      client:   builder.build()?,
      rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
      key:      config.anon_key,
    })
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, format!("{}/{path}", self.rest_url))
      .header("apikey", &self.key)
      .bearer_auth(&self.key)
  }

  async fn send<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { endpoint: path.to_owned(), status, body });
    }
    Ok(resp.json().await?)
  }

  /// `GET /{table}?select=*&...`
  pub(crate) async fn select<T: DeserializeOwned>(
    &self,
    table: &str,
    filters: Filters,
  ) -> Result<Vec<T>> {
    self.select_columns(table, "*", filters).await
  }

  /// `GET /{table}?select={columns}&...`
  pub(crate) async fn select_columns<T: DeserializeOwned>(
    &self,
    table: &str,
    columns: &str,
    filters: Filters,
  ) -> Result<Vec<T>> {
    let req = self
      .request(Method::GET, table)
      .query(&[("select", columns)])
      .query(&filters);
    self.send(table, req).await
  }

  /// The first row matching `filters`, if any.
  pub(crate) async fn select_one<T: DeserializeOwned>(
    &self,
    table: &str,
    mut filters: Filters,
  ) -> Result<Option<T>> {
    filters.push(("limit", "1".to_owned()));
    Ok(self.select(table, filters).await?.into_iter().next())
  }

  /// `POST /{table}` returning the inserted row.
  pub(crate) async fn insert<B, T>(&self, table: &str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    self.insert_columns(table, "*", body).await
  }

  /// `POST /{table}?select={columns}` returning those columns of the
  /// inserted row.
  pub(crate) async fn insert_columns<B, T>(&self, table: &str, columns: &str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let req = self
      .request(Method::POST, table)
      .query(&[("select", columns)])
      .header("Prefer", "return=representation")
      .json(body);
    let rows: Vec<T> = self.send(table, req).await?;
    rows.into_iter().next().ok_or_else(|| no_row(table))
  }

  /// `POST /{table}?on_conflict=...` merging into an existing row.
  pub(crate) async fn upsert<B, T>(&self, table: &str, on_conflict: &str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let req = self
      .request(Method::POST, table)
      .query(&[("on_conflict", on_conflict)])
      .header("Prefer", "resolution=merge-duplicates,return=representation")
      .json(body);
    let rows: Vec<T> = self.send(table, req).await?;
    rows.into_iter().next().ok_or_else(|| no_row(table))
  }

  /// `PATCH /{table}?...` returning the rows that matched `filters`.
  pub(crate) async fn update<B, T>(&self, table: &str, filters: Filters, body: &B) -> Result<Vec<T>>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let req = self
      .request(Method::PATCH, table)
      .query(&filters)
      .header("Prefer", "return=representation")
      .json(body);
    self.send(table, req).await
  }

  /// `DELETE /{table}?...` returning the removed rows.
  pub(crate) async fn delete<T: DeserializeOwned>(
    &self,
    table: &str,
    filters: Filters,
  ) -> Result<Vec<T>> {
    let req = self
      .request(Method::DELETE, table)
      .query(&filters)
      .header("Prefer", "return=representation");
    self.send(table, req).await
  }

  /// `POST /rpc/{function}`
  pub(crate) async fn rpc<B, T>(&self, function: &str, args: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let path = format!("rpc/{function}");
    let req = self.request(Method::POST, &path).json(args);
    self.send(&path, req).await
  }

  // ── Shared lookups ────────────────────────────────────────────────────────

  pub(crate) async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self.select_one("profiles", vec![("profile_id", eq(id))]).await
  }

  pub(crate) async fn fetch_order(&self, id: Uuid) -> Result<Option<Order>> {
    self.select_one("orders", vec![("order_id", eq(id))]).await
  }

  pub(crate) async fn fetch_bid(&self, id: Uuid) -> Result<Option<Bid>> {
    self.select_one("bids", vec![("bid_id", eq(id))]).await
  }
}
