pub mod client;
pub mod traits;

use crate::{
    config::IdeogramConfig,
    error::{ImageMakerError, Result},
    models::{
        GenerateResponse, GenerationRequest, GenerationResult, GenerationStats, GeneratorKind,
        IdeogramModel, PromptDetails,
    },
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_stream::wrappers::ReceiverStream;

pub use client::IdeogramClient;
pub use traits::{ImageGenerationService, ImageProvider};

/// Model assumed for pricing when a request leaves it to the provider.
const DEFAULT_PRICED_MODEL: IdeogramModel = IdeogramModel::V2;

/// Bounds in-flight provider calls to `max_concurrency` and turns every outcome
/// into a [`GenerationResult`].
#[derive(Clone)]
pub struct IdeogramService {
    provider: Arc<dyn ImageProvider>,
    gate: Arc<Semaphore>,
    max_concurrency: usize,
}

impl IdeogramService {
    pub fn new(config: &IdeogramConfig) -> Result<Self> {
        let client = IdeogramClient::new(config)?;
        Self::with_provider(Arc::new(client), config.max_concurrency)
    }

    pub fn with_provider(provider: Arc<dyn ImageProvider>, max_concurrency: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(ImageMakerError::ConfigError(
                "max_concurrency must be at least 1".into(),
            ));
        }

        Ok(Self {
            provider,
            gate: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Slots not currently held by an in-flight call.
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    pub async fn close(&self) {
        self.provider.close().await;
    }

    async fn generate_one(
        &self,
        prompt_details: &mut PromptDetails,
    ) -> Result<Option<(String, GenerateResponse)>> {
        let request =
            GenerationRequest::new(prompt_details.prompt.clone(), &prompt_details.ideogram_details)?;
        let response = self.provider.generate(&request).await?;

        match response.data.len() {
            0 => Ok(None),
            1 => {
                let image = &response.data[0];
                if image.prompt != prompt_details.prompt {
                    log::info!("{} rewrote prompt to: {}", self.generator(), image.prompt);
                }
                prompt_details.apply_rewrite(self.generator(), &image.prompt);
                let url = image.url.clone();
                Ok(Some((url, response)))
            }
            count => Err(ImageMakerError::UnexpectedMultiImage(count)),
        }
    }

    /// Runs every prompt through the gate and yields results as they finish,
    /// which is not necessarily submission order.
    pub fn process_batch(
        self: &Arc<Self>,
        batch: Vec<PromptDetails>,
        stats: Arc<GenerationStats>,
    ) -> Pin<Box<dyn Stream<Item = GenerationResult> + Send>> {
        let (tx, rx) = tokio::sync::mpsc::channel(batch.len().max(1));

        for prompt_details in batch {
            let service = Arc::clone(self);
            let stats = Arc::clone(&stats);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = service.process(prompt_details, &stats).await;
                let _ = tx.send(result).await;
            });
        }

        Box::pin(ReceiverStream::new(rx))
    }
}

#[async_trait]
impl ImageGenerationService for IdeogramService {
    async fn process(&self, mut prompt_details: PromptDetails, stats: &GenerationStats) -> GenerationResult {
        let generator = self.generator();
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return GenerationResult::failure(generator, e.to_string(), prompt_details);
            }
        };

        stats.record_request();
        let price = prompt_details
            .ideogram_details
            .model
            .unwrap_or(DEFAULT_PRICED_MODEL)
            .price_per_image();

        match self.generate_one(&mut prompt_details).await {
            Ok(Some((url, response))) => {
                stats.record_success(price);
                log::info!("{} generated image: {}", generator, url);
                GenerationResult::success(generator, url, prompt_details, response)
            }
            Ok(None) => {
                stats.record_failure();
                log::warn!("{} returned no images for: {}", generator, prompt_details.prompt);
                GenerationResult::failure(generator, "No images generated", prompt_details)
            }
            Err(e) => {
                stats.record_failure();
                log::error!("{} generation failed: {}", generator, e);
                GenerationResult::failure(generator, e.to_string(), prompt_details)
            }
        }
    }

    fn generator(&self) -> GeneratorKind {
        self.provider.kind()
    }
}
