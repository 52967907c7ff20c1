use docmind_core::error::Result;
use docmind_core::traits::Synthesizer;

/// Offline answerer: returns the retrieved passages instead of generating text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSynthesizer;

impl Synthesizer for ExtractiveSynthesizer {
    fn name(&self) -> &str { "extractive" }

    fn generate(&self, prompt: &str, context: &str) -> Result<String> {
        let context = context.trim();
        if context.is_empty() {
            return Ok(format!("No supporting passages were found in the document for:\n{}", prompt.trim()));
        }
        Ok(format!("Relevant passages from the document:\n\n{context}"))
    }
}
