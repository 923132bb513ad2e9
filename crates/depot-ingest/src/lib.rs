//! Offline ingestion of help-centre articles into the knowledge base.
//!
//! Articles are read from local files, image references are replaced by
//! their captions, the text is cut into passages, and each passage is
//! embedded with the document model and written through a
//! [`depot_core::store::KnowledgeStore`]. A failure on one article or
//! passage is logged and counted; the run carries on with the rest.

pub mod captions;
pub mod chunk;
pub mod pipeline;
pub mod source;

pub mod error;

pub use captions::{CaptionIndex, CaptionReport, import_captions};
pub use error::{Error, Result};
pub use pipeline::{IngestOptions, IngestReport, Ingestor};
pub use source::{Article, load_articles, load_captions};
