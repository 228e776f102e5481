pub mod download;
pub mod registry;

use crate::{
    config::Config,
    error::{ImageMakerError, Result},
    ideogram::{IdeogramService, ImageGenerationService},
    models::{
        task::result_key, task_id_for, GenerationStats, GeneratorKind, IdeogramDetails,
        ImageSaveType, NewImageGeneration, ProducerVersion, PromptDetails, StatsSnapshot,
        TaskStatus,
    },
    storage::{RecordStore, ResultStore, ResultStoreManager},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use download::ImageDownloader;
pub use registry::TaskRegistry;

/// A caller's request to generate one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub existing_prompt: Option<i64>,
    pub generator: GeneratorKind,
    #[serde(default)]
    pub ideogram_details: IdeogramDetails,
}

impl SubmitRequest {
    pub fn new(prompt: impl Into<String>, generator: GeneratorKind) -> Self {
        Self {
            prompt: prompt.into(),
            existing_prompt: None,
            generator,
            ideogram_details: IdeogramDetails::default(),
        }
    }

    pub fn with_existing_prompt(mut self, prompt_id: i64) -> Self {
        self.existing_prompt = Some(prompt_id);
        self
    }

    pub fn with_details(mut self, details: IdeogramDetails) -> Self {
        self.ideogram_details = details;
        self
    }
}

struct GenerationJob {
    task_id: String,
    caller: String,
    prompt_text: String,
    details: IdeogramDetails,
    producer_version: ProducerVersion,
}

/// Turns submissions into background generations and answers status polls.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn ImageGenerationService>,
    results: Arc<dyn ResultStore>,
    records: Arc<dyn RecordStore>,
    downloader: Arc<ImageDownloader>,
    registry: Arc<TaskRegistry>,
    stats: Arc<GenerationStats>,
    result_ttl: Duration,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn ImageGenerationService>,
        results: Arc<dyn ResultStore>,
        records: Arc<dyn RecordStore>,
        downloader: ImageDownloader,
    ) -> Self {
        Self {
            service,
            results,
            records,
            downloader: Arc::new(downloader),
            registry: Arc::new(TaskRegistry::new()),
            stats: Arc::new(GenerationStats::new()),
            result_ttl: Duration::from_secs(crate::config::DEFAULT_RESULT_TTL_SECS),
        }
    }

    pub async fn from_config(config: &Config, records: Arc<dyn RecordStore>) -> Result<Self> {
        let service = IdeogramService::new(&config.ideogram)?;
        let results = ResultStoreManager::new(config).await?.store();
        let downloader = ImageDownloader::new(config.media_root.clone());

        Ok(Self::new(Arc::new(service), results, records, downloader).with_result_ttl(config.result_ttl()))
    }

    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn active_tasks(&self) -> usize {
        self.registry.active().await
    }

    /// Validates the request, schedules the generation and returns its task id
    /// without waiting for it.
    pub async fn submit(&self, request: SubmitRequest, caller_identity: &str) -> Result<String> {
        if request.prompt.trim().is_empty() && request.existing_prompt.is_none() {
            return Err(ImageMakerError::ValidationError(
                "Please enter a prompt or choose an existing one.".into(),
            ));
        }
        request.ideogram_details.validate()?;

        let prompt_text = match request.existing_prompt {
            Some(prompt_id) => {
                self.records
                    .get_prompt(prompt_id)
                    .await?
                    .ok_or_else(|| ImageMakerError::NotFoundError(format!("Prompt {}", prompt_id)))?
                    .text
            }
            None => request.prompt,
        };

        let producer_version = self
            .records
            .find_producer_version(request.generator)
            .await?
            .ok_or_else(|| {
                ImageMakerError::NotFoundError(format!(
                    "No producer version registered for {}",
                    request.generator
                ))
            })?;

        if request.generator != self.service.generator() {
            return Err(ImageMakerError::NotFoundError(format!(
                "No generation service available for {}",
                request.generator
            )));
        }

        let task_id = task_id_for(caller_identity, Utc::now().timestamp());
        let job = GenerationJob {
            task_id: task_id.clone(),
            caller: caller_identity.to_string(),
            prompt_text,
            details: request.ideogram_details,
            producer_version,
        };

        log::info!("Dispatching task {} to {}", task_id, request.generator);
        let dispatcher = self.clone();
        let handle = tokio::spawn(async move { dispatcher.run_job(job).await });
        self.registry.register(task_id.clone(), handle).await;

        Ok(task_id)
    }

    /// Absent results, whether not yet written or already expired, read as `Processing`.
    pub async fn poll_status(&self, task_id: &str) -> Result<TaskStatus> {
        match self.results.get(&result_key(task_id)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(TaskStatus::Processing),
        }
    }

    /// Waits for a tracked task to finish, then reports its status.
    pub async fn wait(&self, task_id: &str) -> Result<TaskStatus> {
        self.registry.wait(task_id).await;
        self.poll_status(task_id).await
    }

    /// Aborts a running task and records it as failed, unless it already
    /// recorded a final status.
    pub async fn cancel(&self, task_id: &str) -> Result<bool> {
        if !self.registry.cancel(task_id).await {
            return Ok(false);
        }
        // The job may have recorded its outcome before the abort landed.
        if self.poll_status(task_id).await?.is_finished() {
            log::info!("Task {} already finished, keeping its recorded status", task_id);
            return Ok(false);
        }
        log::warn!("Task {} cancelled", task_id);
        self.store_status(
            task_id,
            &TaskStatus::Error {
                message: "Task cancelled".into(),
            },
        )
        .await?;
        Ok(true)
    }

    async fn store_status(&self, task_id: &str, status: &TaskStatus) -> Result<()> {
        self.results
            .set(&result_key(task_id), serde_json::to_value(status)?, self.result_ttl)
            .await
    }

    async fn run_job(self, job: GenerationJob) {
        let task_id = job.task_id.clone();
        let _timer = crate::logger::timer(&format!("task {}", task_id));

        let status = match self.execute(job).await {
            Ok(image_id) => {
                log::info!("Task {} succeeded with image {}", task_id, image_id);
                TaskStatus::Success { image_id }
            }
            Err(e) => {
                log::error!("Task {} failed: {}", task_id, e);
                TaskStatus::Error {
                    message: e.to_string(),
                }
            }
        };

        if let Err(e) = self.store_status(&task_id, &status).await {
            log::error!("Could not record result of task {}: {}", task_id, e);
        }
    }

    async fn execute(&self, job: GenerationJob) -> Result<i64> {
        let (prompt, _) = self
            .records
            .get_or_create_prompt(&job.prompt_text, &job.caller)
            .await?;

        let prompt_details = PromptDetails::new(job.prompt_text).with_ideogram_details(job.details);
        let result = self.service.process(prompt_details, &self.stats).await;

        if !result.is_success {
            return Err(ImageMakerError::GenerationFailed(
                result
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        let url = result
            .url
            .clone()
            .ok_or_else(|| ImageMakerError::InternalError("successful result has no url".into()))?;

        let generation = self
            .records
            .create_image_generation(NewImageGeneration {
                user: job.caller,
                prompt_id: prompt.id,
                prompt_text: result.prompt_details.prompt.clone(),
                producer_version_id: job.producer_version.id,
                details: serde_json::to_value(&result.prompt_details)?,
                uri: url.clone(),
                result: serde_json::to_value(&result)?,
            })
            .await?;

        let file_path = self.downloader.download_and_save(&url, generation.id).await?;
        self.records
            .create_image_save(generation.id, ImageSaveType::Raw, &file_path)
            .await?;

        Ok(generation.id)
    }
}
