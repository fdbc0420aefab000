use std::collections::HashMap;

use tantivy::tokenizer::TextAnalyzer;

use retrieval_core::traits::TextIndexer;
use retrieval_core::types::LexicalHit;

use crate::analyzer::{build_analyzer, tokenize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
	/// Term-frequency saturation.
	pub k1: f32,
	/// Length normalization, 0 = none, 1 = full.
	pub b: f32,
}

impl Default for Bm25Params {
	fn default() -> Self { Self { k1: 1.5, b: 0.75 } }
}

#[derive(Debug, Clone, Copy)]
struct Posting {
	position: usize,
	tf: u32,
}

/// Okapi BM25 over positional postings.
///
/// Positions are insertion order and line up with the vector index rows.
/// Rebuilding from the same ordered texts yields identical postings.
#[derive(Clone)]
pub struct Bm25Index {
	params: Bm25Params,
	analyzer: TextAnalyzer,
	postings: HashMap<String, Vec<Posting>>,
	doc_lens: Vec<u32>,
	total_len: u64,
}

impl Default for Bm25Index {
	fn default() -> Self { Self::new(Bm25Params::default()) }
}

impl Bm25Index {
	pub fn new(params: Bm25Params) -> Self {
		Self { params, analyzer: build_analyzer(), postings: HashMap::new(), doc_lens: Vec::new(), total_len: 0 }
	}

	pub fn params(&self) -> Bm25Params { self.params }

	pub fn doc_freq(&self, term: &str) -> usize { self.postings.get(term).map_or(0, Vec::len) }

	pub fn avg_doc_len(&self) -> f32 {
		if self.doc_lens.is_empty() { 0.0 } else { self.total_len as f32 / self.doc_lens.len() as f32 }
	}

	fn query_tokens(&self, query: &str) -> Vec<String> {
		let mut analyzer = self.analyzer.clone();
		tokenize(&mut analyzer, query)
	}

	// Lucene-style IDF; stays positive even when a term is in most chunks.
	fn idf(&self, df: usize) -> f32 {
		let n = self.doc_lens.len() as f32;
		let df = df as f32;
		((n - df + 0.5) / (df + 0.5) + 1.0).ln()
	}
}

impl TextIndexer for Bm25Index {
	fn len(&self) -> usize { self.doc_lens.len() }

	fn add(&mut self, texts: &[String]) {
		for text in texts {
			let position = self.doc_lens.len();
			let tokens = tokenize(&mut self.analyzer, text);
			let mut term_freqs: HashMap<String, u32> = HashMap::new();
			for token in &tokens { *term_freqs.entry(token.clone()).or_insert(0) += 1; }
			for (term, tf) in term_freqs {
				self.postings.entry(term).or_default().push(Posting { position, tf });
			}
			self.doc_lens.push(tokens.len() as u32);
			self.total_len += tokens.len() as u64;
		}
	}

	fn reset(&mut self) {
		self.postings.clear();
		self.doc_lens.clear();
		self.total_len = 0;
	}

	fn score(&self, query: &str) -> Vec<f32> {
		let mut scores = vec![0f32; self.doc_lens.len()];
		if scores.is_empty() { return scores; }
		let avgdl = self.avg_doc_len();
		let Bm25Params { k1, b } = self.params;
		for term in self.query_tokens(query) {
			let Some(postings) = self.postings.get(&term) else { continue };
			let idf = self.idf(postings.len());
			for p in postings {
				let tf = p.tf as f32;
				let dl = self.doc_lens[p.position] as f32;
				let norm = k1 * (1.0 - b + b * dl / avgdl);
				scores[p.position] += idf * tf * (k1 + 1.0) / (tf + norm);
			}
		}
		scores
	}

	fn search(&self, query: &str, k: usize) -> Vec<LexicalHit> {
		let mut hits: Vec<LexicalHit> = self
			.score(query)
			.into_iter()
			.enumerate()
			.filter(|(_, score)| *score > 0.0)
			.map(|(position, score)| LexicalHit { position, score })
			.collect();
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.position.cmp(&b.position)));
		hits.truncate(k);
		hits
	}
}
