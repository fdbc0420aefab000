use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use retrieval_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

/// Sentence embedder for BERT-family checkpoints (all-MiniLM-L6-v2 and kin).
///
/// Expects `tokenizer.json`, `config.json` and `model.safetensors` (or
/// `pytorch_model.bin`) in the model directory.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    batch_size: usize,
}

impl BertEmbedder {
    pub fn from_dir(model_dir: &Path, max_len: usize, batch_size: usize) -> Result<Self> {
        let device = select_device();
        info!(model_dir = %model_dir.display(), "Loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;

        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        info!(dim, "Embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, batch_size: batch_size.max(1) })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        if rows.iter().any(|r| r.len() != self.dim) {
            bail!("model produced vectors of unexpected width (expected {})", self.dim);
        }
        Ok(rows)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(VarBuilder::from_buffered_safetensors(fs::read(&safetensors)?, DType::F32, device)?);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    if !weights_path.exists() {
        bail!("No model.safetensors or pytorch_model.bin in {}", model_dir.display());
    }
    warn!(path = %weights_path.display(), "Falling back to pickled weights");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.embed_chunk(chunk)?);
        }
        debug!(count = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Embedded batch");
        Ok(out)
    }
}
