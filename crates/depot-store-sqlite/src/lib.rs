//! SQLite backend for the Depot stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Similarity search is computed
//! in-process over `f32` embeddings stored as little-endian BLOBs.

mod encode;
mod knowledge;
mod market;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
