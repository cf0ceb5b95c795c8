use async_trait::async_trait;

use super::types::ImageInput;
use crate::core::errors::ProviderError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// single-shot text generation
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError>;

    /// generation conditioned on an image plus an instruction
    async fn generate_with_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<String, ProviderError>;
}
