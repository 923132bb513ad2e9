//! Client for the hosted Foundation Models API (text embeddings and chat
//! completion), implementing [`depot_core::llm::Embedder`] and
//! [`depot_core::llm::Completer`].
//!
//! No retries: a failed call is reported to the caller as-is.

mod client;
mod wire;

pub mod error;

pub use client::{
  DEFAULT_BASE_URL, DEFAULT_COMPLETION_MODEL, LlmClient, LlmConfig, MAX_TOKENS, TEMPERATURE,
};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
