use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Merge defaults, `config.toml`, `config.<env>.toml` and `APP_*` env vars.
    ///
    /// Nested keys use `__` in env vars: `APP_EMBEDDING__BACKEND=hashed`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The whole typed configuration tree.
    pub fn settings(&self) -> anyhow::Result<AppConfig> {
        let settings: AppConfig = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let backend: EmbeddingBackend = self.get("embedding.backend")?;
                if backend == EmbeddingBackend::Hashed {
                    tracing::warn!("hashed embeddings configured in production; retrieval quality will be poor");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            other => tracing::debug!(env = other, "unknown RUST_ENV, no env-specific file merged"),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub registry: RegistryConfig,
    pub synthesizer: SynthesizerConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::Configuration("retrieval.top_k must be greater than 0".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::Configuration("embedding.dimension must be greater than 0".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Configuration("embedding.batch_size must be greater than 0".into()));
        }
        if self.embedding.backend == EmbeddingBackend::Remote && self.embedding.api_url.is_none() {
            return Err(Error::Configuration("embedding.api_url is required for the remote backend".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// BERT sentence encoder run in-process with candle.
    Local,
    /// Model-free feature hashing; deterministic, for tests and offline use.
    Hashed,
    /// OpenAI-compatible `/embeddings` endpoint.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    pub model_dir: String,
    pub max_tokens: usize,
    pub batch_size: usize,
    pub api_url: Option<String>,
    pub api_key_env: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Entries kept by the in-memory embedding cache; 0 disables it.
    pub cache_capacity: usize,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Local,
            dimension: 384,
            model_dir: "~/.cache/docmind/all-MiniLM-L6-v2".to_string(),
            max_tokens: 256,
            batch_size: 32,
            api_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            timeout_secs: 30,
            cache_capacity: 4096,
            max_retries: 2,
            retry_base_ms: 200,
            retry_max_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum resident indices; 0 means unbounded.
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerBackend {
    Groq,
    OpenAi,
    Extractive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    pub backend: SynthesizerBackend,
    /// Overrides the backend's default model.
    pub model: Option<String>,
    /// Overrides the backend's default base URL.
    pub api_url: Option<String>,
    /// Overrides the backend's default key variable.
    pub api_key_env: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            backend: SynthesizerBackend::Extractive,
            model: None,
            api_url: None,
            api_key_env: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub max_upload_mb: usize,
    pub enable_cors: bool,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            timeout_secs: 120,
            max_upload_mb: 50,
            enable_cors: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pipeline() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.chunking, ChunkingConfig { chunk_size: 1000, overlap: 200 });
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.embedding.dimension, 384);
        assert_eq!(cfg.registry.capacity, 0);
        assert_eq!(cfg.server.port, 8000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn loads_files_and_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "test");
            jail.create_file(
                "config.toml",
                r#"
                [chunking]
                chunk_size = 500
                overlap = 50

                [embedding]
                backend = "local"
                "#,
            )?;
            jail.create_file(
                "config.test.toml",
                r#"
                [embedding]
                backend = "hashed"
                dimension = 64
                "#,
            )?;
            jail.set_env("APP_RETRIEVAL__TOP_K", "5");

            let config = Config::load().map_err(|e| e.to_string())?;
            let settings = config.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.chunking.chunk_size, 500);
            assert_eq!(settings.embedding.backend, EmbeddingBackend::Hashed);
            assert_eq!(settings.embedding.dimension, 64);
            assert_eq!(settings.retrieval.top_k, 5);
            assert_eq!(settings.synthesizer.backend, SynthesizerBackend::Extractive);
            Ok(())
        });
    }

    #[test]
    fn settings_reject_invalid_chunking() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("APP_CHUNKING__OVERLAP", "2000");
            let config = Config::load().map_err(|e| e.to_string())?;
            assert!(config.settings().is_err());
            Ok(())
        });
    }

    #[test]
    fn model_dir_expands_env_vars() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DOCMIND_MODELS", "/srv/models");
            assert_eq!(expand_path("${DOCMIND_MODELS}/minilm"), PathBuf::from("/srv/models/minilm"));
            assert_eq!(expand_path("models/minilm"), PathBuf::from("models/minilm"));
            Ok(())
        });
    }
}
