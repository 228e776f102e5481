use crate::{
    error::Result,
    models::{GenerateResponse, GenerationRequest, GenerationResult, GenerationStats, GeneratorKind, PromptDetails},
};
use async_trait::async_trait;

/// One HTTP-backed image generation API.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerateResponse>;

    fn kind(&self) -> GeneratorKind;

    /// Releases any held connection. Safe to call repeatedly.
    async fn close(&self) {}
}

/// Gated, normalizing front of a provider. `process` never returns an error:
/// every failure comes back as a result with `is_success == false`.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn process(&self, prompt_details: PromptDetails, stats: &GenerationStats) -> GenerationResult;

    fn generator(&self) -> GeneratorKind;
}
