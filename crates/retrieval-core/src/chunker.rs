//! Fixed-size sliding-window chunking over normalized text.
//!
//! Text is normalized first (soft hyphens removed, whitespace runs collapsed to
//! one space, ends trimmed) so PDF and hard-wrapped sources chunk the same way.
//! Windows are measured in chars and advance by `chunk_size - overlap`; the
//! last window may be shorter. Output is a pure function of its inputs.

use crate::error::{Error, Result};
use crate::types::{chunk_id_for, Chunk, Document};

const SOFT_HYPHEN: char = '\u{00AD}';

pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: 0 }
    }
}

impl Chunker {
    /// Fails unless `overlap < chunk_size`; otherwise the window would never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if overlap >= chunk_size {
            return Err(Error::InvalidChunkParameters { chunk_size, overlap });
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn overlap(&self) -> usize { self.overlap }

    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        let chars: Vec<char> = normalized.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end >= chars.len() { break; }
            start += step;
        }
        chunks
    }

    /// Chunks a document and derives `{id}_chunk_{ordinal}` identifiers.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.chunk_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk { chunk_id: chunk_id_for(&document.id, ordinal), text, ordinal })
            .collect()
    }
}

/// One-shot form of [`Chunker::chunk_text`].
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(Chunker::new(chunk_size, overlap)?.chunk_text(text))
}

pub fn normalize(text: &str) -> String {
    let without_soft_hyphens: String = text.chars().filter(|&c| c != SOFT_HYPHEN).collect();
    without_soft_hyphens.split_whitespace().collect::<Vec<_>>().join(" ")
}
