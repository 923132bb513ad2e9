//! Supabase backend for the Depot stores.
//!
//! Talks to the project's PostgREST endpoint over HTTPS. Similarity search
//! and bid acceptance run inside Postgres as the `match_documents` and
//! `accept_bid` functions (see `sql/schema.sql`); every other status change
//! is a `PATCH` filtered on the row's current state, so a concurrent writer
//! makes it match nothing instead of overwriting.

mod knowledge;
mod market;
mod rows;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SupabaseConfig, SupabaseStore};

/// Database schema and functions expected by this backend.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

#[cfg(test)]
mod tests;
