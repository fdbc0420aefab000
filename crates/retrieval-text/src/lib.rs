//! retrieval-text
//!
//! In-memory BM25 ranking over chunk positions. Tokenization goes through a
//! tantivy analyzer so the lexical side tokenizes exactly like a tantivy index
//! built with the same pipeline.

pub mod analyzer;
pub mod bm25;

pub use analyzer::{build_analyzer, tokenize};
pub use bm25::{Bm25Index, Bm25Params};
