//! Answer synthesis behind the `docmind_core::Synthesizer` trait.
//!
//! The backend is chosen once at startup from `synthesizer.backend`:
//! Groq or OpenAI chat completions, or an offline extractive answerer.

pub mod chat;
pub mod extractive;
pub mod prompt;

use std::sync::Arc;

use docmind_core::config::{SynthesizerBackend, SynthesizerConfig};
use docmind_core::error::Result;
use docmind_core::traits::Synthesizer;

pub use chat::{ChatProvider, ChatSynthesizer};
pub use extractive::ExtractiveSynthesizer;

pub fn synthesizer_from_config(cfg: &SynthesizerConfig) -> Result<Arc<dyn Synthesizer>> {
    let synthesizer: Arc<dyn Synthesizer> = match cfg.backend {
        SynthesizerBackend::Groq => Arc::new(ChatSynthesizer::new(ChatProvider::Groq, cfg)?),
        SynthesizerBackend::OpenAi => Arc::new(ChatSynthesizer::new(ChatProvider::OpenAi, cfg)?),
        SynthesizerBackend::Extractive => Arc::new(ExtractiveSynthesizer),
    };
    tracing::info!(synthesizer = synthesizer.name(), "answer synthesizer ready");
    Ok(synthesizer)
}
