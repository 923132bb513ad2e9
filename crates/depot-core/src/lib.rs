//! Core types and trait definitions for the Depot help-centre backend.
//!
//! This crate is free of HTTP and database dependencies. Every other crate
//! depends on it.

pub mod chat;
pub mod document;
pub mod error;
pub mod lifecycle;
pub mod llm;
pub mod market;
pub mod rag;
pub mod store;

pub use error::{DomainError, Error, Result};
