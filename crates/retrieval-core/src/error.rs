use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Index is empty: add documents or load an index first")]
    EmptyIndex,

    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Missing index file: {}", .0.display())]
    MissingIndexFile(PathBuf),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Invalid chunk parameters: overlap {overlap} must be smaller than chunk_size {chunk_size}")]
    InvalidChunkParameters { chunk_size: usize, overlap: usize },

    #[error("Duplicate chunk id: {0}")]
    DuplicateChunkId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding failed: {0}")]
    Embedding(anyhow::Error),

    #[error("Metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
