use std::collections::HashSet;
use std::path::Path;

use anyhow::anyhow;

use retrieval_core::chunker::Chunker;
use retrieval_core::config::RetrieverSettings;
use retrieval_core::error::{Error, Result};
use retrieval_core::loader::{load_documents, SkippedFile};
use retrieval_core::traits::{Embedder, FileLoader, TextIndexer, VectorIndexer};
use retrieval_core::types::{ChunkId, Document, HybridHit, QueryHit, SourceKind};
use retrieval_text::{Bm25Index, Bm25Params};
use retrieval_vector::FlatIndex;

use crate::merge::{merge, similarity};
use crate::store;

/// Vector hits further than this are treated as "no match" and dropped.
pub const DISTANCE_SENTINEL: f32 = 1e6;

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub documents: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Chunk table, vector index and lexical index kept in lockstep.
///
/// Row `i` of the vector index, `chunk_ids[i]`, `chunk_texts[i]` and lexical
/// position `i` always describe the same chunk. Mutations either apply to all
/// of them or to none.
pub struct HybridRetriever<V: VectorIndexer = FlatIndex, L: TextIndexer = Bm25Index> {
    embedder: Box<dyn Embedder>,
    chunker: Chunker,
    vectors: V,
    lexical: L,
    chunk_ids: Vec<ChunkId>,
    chunk_texts: Vec<String>,
    known_ids: HashSet<ChunkId>,
}

impl HybridRetriever {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self::with_parts(embedder, Chunker::default(), Bm25Index::default())
    }

    pub fn from_settings(embedder: Box<dyn Embedder>, settings: &RetrieverSettings) -> Result<Self> {
        let chunker = Chunker::new(settings.chunk_size, settings.chunk_overlap)?;
        let lexical = Bm25Index::new(Bm25Params { k1: settings.bm25_k1, b: settings.bm25_b });
        Ok(Self::with_parts(embedder, chunker, lexical))
    }
}

impl<V: VectorIndexer + Default, L: TextIndexer> HybridRetriever<V, L> {
    /// Starts from an empty vector index; `lexical` is reset.
    pub fn with_parts(embedder: Box<dyn Embedder>, chunker: Chunker, mut lexical: L) -> Self {
        lexical.reset();
        Self {
            embedder,
            chunker,
            vectors: V::default(),
            lexical,
            chunk_ids: Vec::new(),
            chunk_texts: Vec::new(),
            known_ids: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize { self.chunk_ids.len() }

    pub fn is_empty(&self) -> bool { self.chunk_ids.is_empty() }

    pub fn chunk_ids(&self) -> &[ChunkId] { &self.chunk_ids }

    pub fn chunk_texts(&self) -> &[String] { &self.chunk_texts }

    /// Dimension of the stored vectors, `None` while empty.
    pub fn dim(&self) -> Option<usize> { self.vectors.dim() }

    pub fn chunker(&self) -> &Chunker { &self.chunker }

    /// Chunks, embeds and indexes `documents`. Returns the number of chunks added.
    ///
    /// Nothing is indexed if any chunk id already exists, the embedder fails,
    /// or a vector has the wrong dimension.
    pub fn add_documents(&mut self, documents: &[Document]) -> Result<usize> {
        let mut ids = Vec::new();
        let mut texts = Vec::new();
        let mut batch_ids = HashSet::new();
        for document in documents {
            for chunk in self.chunker.split(document) {
                if self.known_ids.contains(&chunk.chunk_id) || !batch_ids.insert(chunk.chunk_id.clone()) {
                    return Err(Error::DuplicateChunkId(chunk.chunk_id));
                }
                ids.push(chunk.chunk_id);
                texts.push(chunk.text);
            }
        }
        if texts.is_empty() { return Ok(0); }

        let vectors = self.embed(&texts)?;
        self.vectors.add(vectors)?;
        self.lexical.add(&texts);

        let added = ids.len();
        self.known_ids.extend(ids.iter().cloned());
        self.chunk_ids.extend(ids);
        self.chunk_texts.extend(texts);
        Ok(added)
    }

    /// Loads every supported file under `path` and indexes it in one batch.
    pub fn add_files_from_path(&mut self, path: impl AsRef<Path>, loader: &dyn FileLoader) -> Result<IngestSummary> {
        let report = load_documents(path.as_ref(), loader)?;
        let chunks = self.add_documents(&report.documents)?;
        Ok(IngestSummary { documents: report.documents.len(), chunks, skipped: report.skipped })
    }

    /// Nearest chunks by squared L2 distance, closest first.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<QueryHit>> {
        if self.is_empty() { return Err(Error::EmptyIndex); }
        let query = self.embed_one(text)?;
        let hits = self.vectors.search(&query, k)?;
        Ok(hits
            .into_iter()
            .filter(|h| h.distance.is_finite() && h.distance <= DISTANCE_SENTINEL)
            .filter_map(|h| {
                Some(QueryHit {
                    chunk_id: self.chunk_ids.get(h.position)?.clone(),
                    text: self.chunk_texts.get(h.position)?.clone(),
                    distance: h.distance,
                })
            })
            .collect())
    }

    /// Lexical and vector results merged without duplicate texts, at most `k`.
    pub fn hybrid_query(&self, text: &str, k: usize) -> Result<Vec<HybridHit>> {
        let vector_hits = self
            .query(text, k)?
            .into_iter()
            .map(|h| HybridHit { chunk_id: h.chunk_id, text: h.text, score: similarity(h.distance), source: SourceKind::Vector })
            .collect();
        let lexical_hits = self
            .lexical
            .search(text, k)
            .into_iter()
            .filter_map(|h| {
                Some(HybridHit {
                    chunk_id: self.chunk_ids.get(h.position)?.clone(),
                    text: self.chunk_texts.get(h.position)?.clone(),
                    score: h.score,
                    source: SourceKind::Lexical,
                })
            })
            .collect();
        Ok(merge(vector_hits, lexical_hits, k))
    }

    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        if self.is_empty() { return Err(Error::EmptyIndex); }
        store::save(dir.as_ref(), &self.vectors, &self.chunk_ids, &self.chunk_texts)
    }

    /// Replaces all state with the index stored in `dir`.
    ///
    /// On error the current state is left untouched.
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let snapshot = store::load::<V>(dir.as_ref())?;
        if let Some(stored) = snapshot.vectors.dim() {
            let expected = self.embedder.dim();
            if stored != expected {
                return Err(Error::DimensionMismatch { expected, actual: stored });
            }
        }

        self.vectors = snapshot.vectors;
        self.known_ids = snapshot.chunk_ids.iter().cloned().collect();
        self.chunk_ids = snapshot.chunk_ids;
        self.chunk_texts = snapshot.chunk_texts;
        self.lexical.reset();
        self.lexical.add(&self.chunk_texts);
        Ok(())
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed_batch(texts).map_err(Error::Embedding)?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(anyhow!("embedder returned {} vectors for {} texts", vectors.len(), texts.len())));
        }
        let expected = self.embedder.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(Error::DimensionMismatch { expected, actual: bad.len() });
        }
        Ok(vectors)
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding(anyhow!("embedder returned no vector")))
    }
}
