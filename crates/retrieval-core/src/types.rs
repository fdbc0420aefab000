//! Domain types shared by the chunker, both indexes and the hybrid engine.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A source document handed to ingestion.
///
/// `id` must be unique across the corpus. [`Document::new`] makes it
/// filesystem-safe; ids built by hand are sanitized again when chunk ids are
/// derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl AsRef<str>, text: impl Into<String>) -> Self {
        Self { id: sanitize_id(id.as_ref()), text: text.into() }
    }
}

/// One window of a document's normalized text.
///
/// - `chunk_id`: `{document_id}_chunk_{ordinal}`, unique across the index
/// - `ordinal`: position of the window inside its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub text: String,
    pub ordinal: usize,
}

/// Replace whitespace and path separators so the id can double as a file name.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

pub fn chunk_id_for(document_id: &str, ordinal: usize) -> ChunkId {
    format!("{}_chunk_{}", sanitize_id(document_id), ordinal)
}

/// Raw vector-index result: row position and squared L2 distance (lower is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit {
    pub position: usize,
    pub distance: f32,
}

/// Raw lexical-index result: row position and BM25 score (higher is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalHit {
    pub position: usize,
    pub score: f32,
}

/// Indicates which index produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Lexical,
}

/// A vector-only query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub chunk_id: ChunkId,
    pub text: String,
    pub distance: f32,
}

/// A merged query result.
///
/// `score` is higher-is-better for both sources: the BM25 score for lexical
/// hits, `1 / (1 + distance)` for vector hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridHit {
    pub chunk_id: ChunkId,
    pub text: String,
    pub score: f32,
    pub source: SourceKind,
}
