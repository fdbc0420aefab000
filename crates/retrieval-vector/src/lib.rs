//! retrieval-vector
//!
//! Exact brute-force nearest-neighbour search over a flat, row-major array of
//! embeddings, plus the native binary form the index is persisted in.

pub mod codec;
pub mod flat;

pub use flat::{squared_l2, FlatIndex};
