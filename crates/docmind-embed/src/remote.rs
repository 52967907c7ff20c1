//! OpenAI-compatible `/embeddings` client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use docmind_core::config::EmbeddingConfig;
use docmind_core::error::{Error, Result};
use docmind_core::traits::Embedder;
use docmind_core::types::Vector;

pub struct RemoteEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
    timeout: Duration,
    id: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self> {
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| Error::Configuration("embedding.api_url is required for the remote backend".into()))?;
        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(var = %cfg.api_key_env, "no API key set for remote embeddings");
        }
        Ok(Self {
            client,
            id: format!("remote:{}:d{}", cfg.model, cfg.dimension),
            url,
            model: cfg.model.clone(),
            api_key,
            dim: cfg.dimension,
            timeout,
        })
    }

    fn request(&self, texts: &[String]) -> Result<EmbeddingsResponse> {
        let mut req = self.client.post(&self.url).json(&json!({
            "model": self.model,
            "input": texts,
        }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().map_err(|e| {
            if e.is_timeout() {
                Error::Embedding(format!("{} timed out after {:?}", self.url, self.timeout))
            } else {
                Error::Embedding(format!("{} unavailable: {e}", self.url))
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Embedding(format!("{} returned {status}: {body}", self.url)));
        }
        resp.json().map_err(|e| Error::Embedding(format!("malformed embeddings response: {e}")))
    }
}

impl Embedder for RemoteEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut items = self.request(texts)?.data;
        if items.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, received {}",
                texts.len(),
                items.len()
            )));
        }
        // without indices the response is taken to be in input order
        if items.iter().any(|item| item.index.is_some()) {
            items.sort_by_key(|item| item.index);
            if items.iter().enumerate().any(|(i, item)| item.index != Some(i)) {
                let indices: Vec<Option<usize>> = items.iter().map(|item| item.index).collect();
                return Err(Error::Embedding(format!(
                    "embedding indices {indices:?} do not cover 0..{}",
                    texts.len()
                )));
            }
        }
        items
            .into_iter()
            .map(|item| {
                if item.embedding.len() == self.dim {
                    Ok(item.embedding)
                } else {
                    Err(Error::DimensionMismatch { expected: self.dim, actual: item.embedding.len() })
                }
            })
            .collect()
    }
}
