//! retrieval-core
//!
//! Shared vocabulary of the retrieval workspace: documents and chunks, the
//! error taxonomy, the seam traits every backend implements, the chunker,
//! file ingestion and configuration.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
