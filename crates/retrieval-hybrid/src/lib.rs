//! Hybrid retrieval engine: chunking, dense and lexical search, merging and
//! on-disk persistence behind a single [`HybridRetriever`].

pub mod engine;
pub mod merge;
pub mod store;

pub use engine::{HybridRetriever, IngestSummary, DISTANCE_SENTINEL};
pub use merge::merge;
