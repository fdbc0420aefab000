//! Paired on-disk layout of an index directory.
//!
//! - `vectors.bin`: the vector index in its native binary form
//! - `metadata.json`: `{ "version", "vectors_crc32", "chunk_ids", "chunk_texts" }`
//!   in row order
//!
//! Both artifacts are written to temp files in the target directory and only
//! renamed into place once both are complete. `vectors_crc32` is the CRC-32 of
//! the whole `vectors.bin` written alongside the metadata, so a directory left
//! with files from two different saves is rejected on load. The lexical index
//! is never stored; it is rebuilt from `chunk_texts`.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use retrieval_core::error::{Error, Result};
use retrieval_core::traits::VectorIndexer;
use retrieval_core::types::ChunkId;

pub const VECTOR_FILE: &str = "vectors.bin";
pub const METADATA_FILE: &str = "metadata.json";
pub const METADATA_VERSION: u32 = 1;

#[derive(Serialize)]
struct MetadataRef<'a> {
    version: u32,
    vectors_crc32: u32,
    chunk_ids: &'a [ChunkId],
    chunk_texts: &'a [String],
}

#[derive(Deserialize)]
struct Metadata {
    version: u32,
    vectors_crc32: u32,
    chunk_ids: Vec<ChunkId>,
    chunk_texts: Vec<String>,
}

/// Everything [`load`] recovers from an index directory, already validated.
#[derive(Debug)]
pub struct Snapshot<V> {
    pub vectors: V,
    pub chunk_ids: Vec<ChunkId>,
    pub chunk_texts: Vec<String>,
}

pub fn save<V: VectorIndexer>(dir: &Path, vectors: &V, chunk_ids: &[ChunkId], chunk_texts: &[String]) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut vector_bytes = Vec::new();
    vectors.write_to(&mut vector_bytes)?;
    let vectors_crc32 = crc32fast::hash(&vector_bytes);

    let mut vector_tmp = NamedTempFile::new_in(dir)?;
    vector_tmp.write_all(&vector_bytes)?;
    vector_tmp.as_file().sync_all()?;

    let metadata = MetadataRef { version: METADATA_VERSION, vectors_crc32, chunk_ids, chunk_texts };
    let mut metadata_tmp = NamedTempFile::new_in(dir)?;
    metadata_tmp.write_all(&serde_json::to_vec(&metadata)?)?;
    metadata_tmp.as_file().sync_all()?;

    vector_tmp.persist(dir.join(VECTOR_FILE)).map_err(|e| e.error)?;
    metadata_tmp.persist(dir.join(METADATA_FILE)).map_err(|e| e.error)?;
    Ok(())
}

pub fn load<V: VectorIndexer>(dir: &Path) -> Result<Snapshot<V>> {
    let vector_path = dir.join(VECTOR_FILE);
    let metadata_path = dir.join(METADATA_FILE);
    for path in [&vector_path, &metadata_path] {
        if !path.is_file() {
            return Err(Error::MissingIndexFile(path.clone()));
        }
    }

    let vector_bytes = fs::read(&vector_path)?;
    let metadata: Metadata = serde_json::from_reader(BufReader::new(File::open(&metadata_path)?))
        .map_err(|e| Error::CorruptIndex(format!("{METADATA_FILE}: {e}")))?;

    if metadata.version != METADATA_VERSION {
        return Err(Error::CorruptIndex(format!("unsupported metadata version {}", metadata.version)));
    }
    if crc32fast::hash(&vector_bytes) != metadata.vectors_crc32 {
        return Err(Error::CorruptIndex(format!("{VECTOR_FILE} does not belong to {METADATA_FILE} (checksum mismatch)")));
    }
    let vectors = V::read_from(&mut vector_bytes.as_slice())?;
    if metadata.chunk_ids.len() != metadata.chunk_texts.len() {
        return Err(Error::CorruptIndex(format!(
            "{METADATA_FILE} lists {} chunk ids but {} chunk texts",
            metadata.chunk_ids.len(),
            metadata.chunk_texts.len()
        )));
    }
    if vectors.len() != metadata.chunk_ids.len() {
        return Err(Error::CorruptIndex(format!(
            "{VECTOR_FILE} holds {} vectors but {METADATA_FILE} lists {} chunks",
            vectors.len(),
            metadata.chunk_ids.len()
        )));
    }
    let mut seen = HashSet::with_capacity(metadata.chunk_ids.len());
    if let Some(dup) = metadata.chunk_ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(Error::CorruptIndex(format!("duplicate chunk id {dup}")));
    }

    Ok(Snapshot { vectors, chunk_ids: metadata.chunk_ids, chunk_texts: metadata.chunk_texts })
}
