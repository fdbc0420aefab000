use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::types::{LexicalHit, VectorHit};

/// Turns text into fixed-size vectors. One vector per input, same order.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Exact nearest-neighbour store addressed by insertion position.
pub trait VectorIndexer: Send + Sync {
    /// Fixed by the first non-empty `add`; `None` until then.
    fn dim(&self) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Appends the whole batch or nothing.
    fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()>;
    /// Ascending by distance, at most `k` hits.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>>;
    fn write_to(&self, writer: &mut dyn Write) -> Result<()>;
    fn read_from(reader: &mut dyn Read) -> Result<Self>
    where
        Self: Sized;
}

/// Lexical ranking over the same positions as the vector store.
pub trait TextIndexer: Send + Sync {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn add(&mut self, texts: &[String]);
    fn reset(&mut self);
    /// One score per indexed position.
    fn score(&self, query: &str) -> Vec<f32>;
    /// Descending by score, ties by ascending position, at most `k` hits.
    fn search(&self, query: &str, k: usize) -> Vec<LexicalHit>;
}

/// Extracts plain text from a file on disk.
pub trait FileLoader: Send + Sync {
    fn supports(&self, path: &Path) -> bool;
    fn extract(&self, path: &Path) -> anyhow::Result<String>;
}
