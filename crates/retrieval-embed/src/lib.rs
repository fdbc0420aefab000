//! Text embedding backends.
//!
//! [`BertEmbedder`] runs a local sentence-transformer checkpoint through
//! candle; [`HashingEmbedder`] is a deterministic, model-free fallback used by
//! tests and by `APP_USE_FAKE_EMBEDDINGS=1`.

pub mod device;
pub mod hashing;
pub mod model;
pub mod pool;
pub mod tokenize;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::info;

use retrieval_core::config::{expand_path, EmbeddingSettings};
use retrieval_core::traits::Embedder;

pub use hashing::HashingEmbedder;
pub use model::BertEmbedder;
pub use pool::masked_mean_l2;

const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake || settings.backend == "hashing" {
        info!(dim = settings.hashing_dim, "Using hashing embedder");
        return Ok(Box::new(HashingEmbedder::new(settings.hashing_dim)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(BertEmbedder::from_dir(&model_dir, settings.max_len, settings.batch_size)?))
}

/// Configured dir, then `APP_MODEL_DIR`, then `MODEL_DIR`, then `models/all-MiniLM-L6-v2`.
pub fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { info!(path = %p.display(), "Using configured model dir"); return Ok(p); }
        return Err(anyhow!("Configured model directory does not exist: {}", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(dir);
            if p.exists() { info!(path = %p.display(), "Using {}", var); return Ok(p); }
        }
    }
    let fallback = Path::new(DEFAULT_MODEL_DIR);
    if fallback.exists() { info!(path = %fallback.display(), "Using model dir"); return Ok(fallback.to_path_buf()); }
    Err(anyhow!("Could not locate a sentence embedding model; set embedding.model_dir or APP_MODEL_DIR"))
}
