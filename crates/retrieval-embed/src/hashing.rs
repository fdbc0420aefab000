use std::hash::Hasher;

use twox_hash::XxHash64;

use retrieval_core::traits::Embedder;

const TRIGRAM_SEED: u64 = 0;
const WORD_SEED: u64 = 1;

/// Model-free embedder built on the hashing trick.
///
/// Each lowercase alphanumeric word contributes one count for itself and one
/// for every char trigram of `#word#`, bucketed by XxHash64. Vectors are
/// L2-normalized, so words sharing stems ("mystery" / "mysteries") land close
/// together. Deterministic across runs and platforms.
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            v[self.bucket(word.as_bytes(), WORD_SEED)] += 1.0;
            let padded: Vec<char> = std::iter::once('#').chain(word.chars()).chain(std::iter::once('#')).collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                v[self.bucket(gram.as_bytes(), TRIGRAM_SEED)] += 1.0;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }

    fn bucket(&self, bytes: &[u8], seed: u64) -> usize {
        let mut hasher = XxHash64::with_seed(seed);
        hasher.write(bytes);
        (hasher.finish() % self.dim as u64) as usize
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
