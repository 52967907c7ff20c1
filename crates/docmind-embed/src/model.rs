//! In-process BERT sentence encoder (all-MiniLM-L6-v2 and compatible).

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use docmind_core::error::Error;
use docmind_core::traits::Embedder;
use docmind_core::types::Vector;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_tokens: usize,
    pad_id: u32,
    id: String,
}

impl SentenceEncoder {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors`
    /// (or `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, max_tokens: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(model_dir = %model_dir.display(), "loading sentence encoder");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?["hidden_size"]
            .as_u64()
            .and_then(|d| usize::try_from(d).ok())
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))?;

        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        let name = model_dir.file_name().map_or_else(|| "model".into(), |n| n.to_string_lossy().to_string());
        tracing::info!(dim, max_tokens, "sentence encoder ready");

        Ok(Self { model, tokenizer, device, dim, max_tokens, pad_id, id: format!("local:{name}:d{dim}") })
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, texts, self.max_tokens, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis(), "encoded batch");
        Ok(vectors)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let tensors: HashMap<String, Tensor> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let weights_path = model_dir.join("pytorch_model.bin");
        candle_core::pickle::read_all(&weights_path)
            .with_context(|| format!("No model.safetensors and failed to read {}", weights_path.display()))?
            .into_iter()
            .collect()
    };
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

impl Embedder for SentenceEncoder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> docmind_core::Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.encode(texts).map_err(|e| Error::Embedding(format!("{}: {e:#}", self.id)))
    }
}
