//! Text extraction for local documents with a remote OCR fallback and a
//! sidecar cache that tracks source staleness.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod processing;

pub use config::Config;
pub use error::{DocsiftError, Result};
