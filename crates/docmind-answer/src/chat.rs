//! OpenAI-compatible chat-completions client (Groq, OpenAI).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use docmind_core::config::SynthesizerConfig;
use docmind_core::error::{Error, Result};
use docmind_core::traits::Synthesizer;

use crate::prompt::{user_message, SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatProvider {
    Groq,
    OpenAi,
}

impl ChatProvider {
    fn endpoint(self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Groq => "mixtral-8x7b-32768",
            Self::OpenAi => "gpt-3.5-turbo",
        }
    }

    fn key_env(self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
        }
    }
}

pub struct ChatSynthesizer {
    client: Client,
    provider: ChatProvider,
    url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl ChatSynthesizer {
    /// Fails when the provider's API key variable is unset.
    pub fn new(provider: ChatProvider, cfg: &SynthesizerConfig) -> Result<Self> {
        let key_env = cfg.api_key_env.clone().unwrap_or_else(|| provider.key_env().to_string());
        let api_key = std::env::var(&key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Configuration(format!("{key_env} must be set for the {} synthesizer", provider.label())))?;
        Self::with_api_key(provider, cfg, api_key)
    }

    pub fn with_api_key(provider: ChatProvider, cfg: &SynthesizerConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            provider,
            url: cfg.api_url.clone().unwrap_or_else(|| provider.endpoint().to_string()),
            model: cfg.model.clone().unwrap_or_else(|| provider.default_model().to_string()),
            api_key,
            temperature: cfg.temperature,
        })
    }

    pub fn model(&self) -> &str { &self.model }
}

impl Synthesizer for ChatSynthesizer {
    fn name(&self) -> &str { self.provider.label() }

    fn generate(&self, prompt: &str, context: &str) -> Result<String> {
        let request = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message(prompt, context) },
            ],
        });
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::error!(endpoint = %self.url, "chat completion timed out");
                    Error::Synthesis(format!("{} timed out", self.provider.label()))
                } else {
                    Error::Synthesis(format!("{} unavailable: {e}", self.provider.label()))
                }
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Synthesis(format!("{} returned {status}: {body}", self.provider.label())));
        }
        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| Error::Synthesis(format!("malformed chat response: {e}")))?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Synthesis("no choices returned".into()))?;
        tracing::debug!(model = %self.model, chars = answer.len(), "answer generated");
        Ok(answer)
    }
}
