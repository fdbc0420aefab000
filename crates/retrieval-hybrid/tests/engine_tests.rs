use std::fs;
use std::path::Path;

use retrieval_core::chunker::Chunker;
use retrieval_core::error::Error;
use retrieval_core::loader::PlainTextLoader;
use retrieval_core::traits::Embedder;
use retrieval_core::types::{Document, SourceKind};
use retrieval_embed::HashingEmbedder;
use retrieval_hybrid::store::{METADATA_FILE, VECTOR_FILE};
use retrieval_hybrid::HybridRetriever;
use retrieval_text::Bm25Index;
use retrieval_vector::FlatIndex;

const DIM: usize = 384;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("doc1", "The little prince travels from planet to planet, learning life lessons."),
        Document::new("doc2", "Sherlock Holmes solves mysteries using his keen observation and logic."),
    ]
}

fn engine() -> HybridRetriever { HybridRetriever::new(Box::new(HashingEmbedder::new(DIM))) }

fn built() -> HybridRetriever {
    let mut e = engine();
    e.add_documents(&corpus()).unwrap();
    e
}

fn rewrite_metadata(dir: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
    let path = dir.join(METADATA_FILE);
    let mut value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    edit(&mut value);
    fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
}

#[test]
fn detective_query_finds_sherlock() {
    let e = built();
    let hits = e.query("detective solving a mystery", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].chunk_id.starts_with("doc2"), "{:?}", hits);
}

#[test]
fn planet_query_survives_save_and_load() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    assert!(tmp.path().join(VECTOR_FILE).is_file());
    assert!(tmp.path().join(METADATA_FILE).is_file());

    let mut loaded = engine();
    loaded.load(tmp.path()).unwrap();
    let hits = loaded.query("planet journey", 1).unwrap();
    assert!(hits[0].chunk_id.starts_with("doc1"), "{:?}", hits);
}

#[test]
fn hybrid_query_never_exceeds_corpus() {
    let e = built();
    assert_eq!(e.len(), 2);
    let hits = e.hybrid_query("planet mysteries logic", 5).unwrap();
    assert!(hits.len() <= 2);
    assert!(!hits.is_empty());
}

#[test]
fn hybrid_query_puts_lexical_matches_first() {
    let e = built();
    let hits = e.hybrid_query("Holmes", 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].source, SourceKind::Lexical);
    assert!(hits[0].chunk_id.starts_with("doc2"));
    assert_eq!(hits[1].source, SourceKind::Vector);
    assert!(hits[1].chunk_id.starts_with("doc1"));
}

#[test]
fn hybrid_query_has_no_duplicate_texts() {
    let mut e = HybridRetriever::from_settings(
        Box::new(HashingEmbedder::new(DIM)),
        &retrieval_core::config::RetrieverSettings { chunk_size: 20, chunk_overlap: 5, ..Default::default() },
    )
    .unwrap();
    e.add_documents(&[
        Document::new("a", "the cat sat on the mat while the dog slept by the door"),
        Document::new("b", "the cat sat on the mat"),
    ])
    .unwrap();
    for k in 1..=e.len() + 2 {
        let hits = e.hybrid_query("cat on the mat", k).unwrap();
        assert!(hits.len() <= k);
        let mut texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), hits.len());
    }
}

#[test]
fn query_with_large_k_returns_everything() {
    let e = built();
    let hits = e.query("anything at all", 50).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].distance <= hits[1].distance);
}

#[test]
fn round_trip_preserves_results() {
    let mut original = HybridRetriever::from_settings(
        Box::new(HashingEmbedder::new(DIM)),
        &retrieval_core::config::RetrieverSettings { chunk_size: 40, chunk_overlap: 10, ..Default::default() },
    )
    .unwrap();
    original.add_documents(&corpus()).unwrap();
    original
        .add_documents(&[Document::new("doc3", "A planet of mysteries, observed with logic by a little detective.")])
        .unwrap();

    let tmp = tempfile::tempdir().unwrap();
    original.save(tmp.path()).unwrap();
    let mut loaded = engine();
    loaded.load(tmp.path()).unwrap();

    assert_eq!(loaded.chunk_ids(), original.chunk_ids());
    assert_eq!(loaded.chunk_texts(), original.chunk_texts());
    for q in ["planet journey", "detective solving a mystery", "logic", "zebra"] {
        for k in [1, 3, 100] {
            assert_eq!(loaded.query(q, k).unwrap(), original.query(q, k).unwrap());
            assert_eq!(loaded.hybrid_query(q, k).unwrap(), original.hybrid_query(q, k).unwrap());
        }
    }
}

#[test]
fn chunk_ids_are_unique_and_ordered() {
    let mut e = HybridRetriever::from_settings(
        Box::new(HashingEmbedder::new(DIM)),
        &retrieval_core::config::RetrieverSettings { chunk_size: 10, chunk_overlap: 2, ..Default::default() },
    )
    .unwrap();
    e.add_documents(&corpus()).unwrap();
    let ids = e.chunk_ids();
    assert_eq!(ids[0], "doc1_chunk_0");
    assert_eq!(ids[1], "doc1_chunk_1");
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(e.chunk_texts().len(), ids.len());
}

#[test]
fn duplicate_documents_are_rejected_atomically() {
    let mut e = built();
    let err = e.add_documents(&[Document::new("doc3", "fresh"), Document::new("doc1", "again")]).unwrap_err();
    assert!(matches!(err, Error::DuplicateChunkId(ref id) if id == "doc1_chunk_0"), "{err}");
    assert_eq!(e.len(), 2);

    let mut fresh = engine();
    let err = fresh.add_documents(&[Document::new("x", "one"), Document::new("x", "two")]).unwrap_err();
    assert!(matches!(err, Error::DuplicateChunkId(_)));
    assert!(fresh.is_empty());
}

#[test]
fn empty_documents_add_nothing() {
    let mut e = engine();
    assert_eq!(e.add_documents(&[Document::new("blank", "   \n\t ")]).unwrap(), 0);
    assert!(e.is_empty());
    assert_eq!(e.dim(), None);
}

#[test]
fn empty_index_errors() {
    let e = engine();
    assert!(matches!(e.query("x", 3), Err(Error::EmptyIndex)));
    assert!(matches!(e.hybrid_query("x", 3), Err(Error::EmptyIndex)));
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(e.save(tmp.path()), Err(Error::EmptyIndex)));
}

#[test]
fn missing_artifacts_are_reported() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    fs::remove_file(tmp.path().join(METADATA_FILE)).unwrap();

    let mut e = engine();
    match e.load(tmp.path()) {
        Err(Error::MissingIndexFile(p)) => assert!(p.ends_with(METADATA_FILE)),
        other => panic!("unexpected: {:?}", other.err()),
    }

    let empty = tempfile::tempdir().unwrap();
    match e.load(empty.path()) {
        Err(Error::MissingIndexFile(p)) => assert!(p.ends_with(VECTOR_FILE)),
        other => panic!("unexpected: {:?}", other.err()),
    }
}

#[test]
fn count_mismatch_is_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    rewrite_metadata(tmp.path(), |v| {
        v["chunk_ids"].as_array_mut().unwrap().push("doc9_chunk_0".into());
        v["chunk_texts"].as_array_mut().unwrap().push("extra".into());
    });
    let mut e = built();
    let err = e.load(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::CorruptIndex(_)), "{err}");
    // failed load leaves the previous state in place
    assert_eq!(e.len(), 2);
    assert!(e.query("planet", 1).is_ok());
}

#[test]
fn unequal_metadata_lists_are_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    rewrite_metadata(tmp.path(), |v| {
        v["chunk_texts"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(engine().load(tmp.path()), Err(Error::CorruptIndex(_))));
}

#[test]
fn unknown_metadata_version_is_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    rewrite_metadata(tmp.path(), |v| v["version"] = 7.into());
    let err = engine().load(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("unsupported metadata version 7"), "{err}");
}

#[test]
fn garbled_metadata_is_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    fs::write(tmp.path().join(METADATA_FILE), "{not json").unwrap();
    assert!(matches!(engine().load(tmp.path()), Err(Error::CorruptIndex(_))));
}

#[test]
fn load_rejects_embedder_with_other_dimension() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    let mut narrow = HybridRetriever::new(Box::new(HashingEmbedder::new(64)));
    match narrow.load(tmp.path()) {
        Err(Error::DimensionMismatch { expected, actual }) => {
            assert_eq!(expected, 64);
            assert_eq!(actual, DIM);
        }
        other => panic!("unexpected: {:?}", other.err()),
    }
    assert!(narrow.is_empty());
}

#[test]
fn ingest_from_directory() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("prince.txt"), corpus()[0].text.as_bytes()).unwrap();
    fs::create_dir(tmp.path().join("cases")).unwrap();
    fs::write(tmp.path().join("cases/holmes.md"), corpus()[1].text.as_bytes()).unwrap();
    fs::write(tmp.path().join("cover.png"), [0u8, 1, 2]).unwrap();

    let mut e = engine();
    let summary = e.add_files_from_path(tmp.path(), &PlainTextLoader).unwrap();
    assert_eq!(summary.documents, 2);
    assert_eq!(summary.chunks, 2);
    assert!(summary.skipped.is_empty());
    assert_eq!(e.chunk_ids(), ["cases_holmes_chunk_0", "prince_chunk_0"]);

    let hits = e.query("detective solving a mystery", 1).unwrap();
    assert_eq!(hits[0].chunk_id, "cases_holmes_chunk_0");
}

#[test]
fn ingest_missing_path_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let mut e = engine();
    let err = e.add_files_from_path(tmp.path().join("absent"), &PlainTextLoader).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn dim(&self) -> usize { 4 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![0.0; 4]).collect())
    }
}

#[test]
fn embedder_returning_too_few_vectors_fails_cleanly() {
    let mut e: HybridRetriever<FlatIndex, Bm25Index> =
        HybridRetriever::with_parts(Box::new(BrokenEmbedder), Chunker::default(), Bm25Index::default());
    let err = e.add_documents(&corpus()).unwrap_err();
    assert!(matches!(err, Error::Embedding(_)), "{err}");
    assert!(e.is_empty());
}

#[test]
fn vectors_from_another_save_are_rejected() {
    let first = tempfile::tempdir().unwrap();
    built().save(first.path()).unwrap();

    let mut other = engine();
    other
        .add_documents(&[
            Document::new("doc1", "Quarks bind into protons and neutrons."),
            Document::new("doc2", "Yeast makes bread dough rise overnight."),
        ])
        .unwrap();
    let second = tempfile::tempdir().unwrap();
    other.save(second.path()).unwrap();

    fs::copy(second.path().join(VECTOR_FILE), first.path().join(VECTOR_FILE)).unwrap();
    let mut e = engine();
    let err = e.load(first.path()).unwrap_err();
    assert!(matches!(err, Error::CorruptIndex(_)), "{err}");
    assert!(e.is_empty());
}

#[test]
fn resaving_replaces_both_files_together() {
    let tmp = tempfile::tempdir().unwrap();
    built().save(tmp.path()).unwrap();
    let mut bigger = built();
    bigger.add_documents(&[Document::new("doc3", "A third, unrelated note about gardening.")]).unwrap();
    bigger.save(tmp.path()).unwrap();

    let mut e = engine();
    e.load(tmp.path()).unwrap();
    assert_eq!(e.len(), 3);
}

/// Puts chunks starting with "distant" far out along a single axis.
struct AxisEmbedder;

impl Embedder for AxisEmbedder {
    fn dim(&self) -> usize { 1 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| vec![if t.starts_with("distant") { 2000.0 } else { 0.0 }]).collect())
    }
}

#[test]
fn hits_beyond_distance_sentinel_are_dropped() {
    let mut e: HybridRetriever<FlatIndex, Bm25Index> =
        HybridRetriever::with_parts(Box::new(AxisEmbedder), Chunker::default(), Bm25Index::default());
    e.add_documents(&[Document::new("far", "distant galaxy"), Document::new("near", "cosy home")]).unwrap();

    // squared distance to "distant galaxy" is 4e6
    let hits = e.query("galaxy", 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk_id, "near_chunk_0");
    assert!(hits[0].distance <= retrieval_hybrid::DISTANCE_SENTINEL);

    let hybrid = e.hybrid_query("galaxy", 5).unwrap();
    let found: Vec<(&str, SourceKind)> = hybrid.iter().map(|h| (h.chunk_id.as_str(), h.source)).collect();
    assert_eq!(found, vec![("far_chunk_0", SourceKind::Lexical), ("near_chunk_0", SourceKind::Vector)]);
}
