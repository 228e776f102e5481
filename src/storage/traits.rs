use crate::{
    error::Result,
    models::{
        GeneratorKind, ImageGenerationRecord, ImageSaveRecord, ImageSaveType, NewImageGeneration,
        ProducerVersion, PromptRecord,
    },
};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Short-lived keyed store for task results. No guarantees across keys.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Persistence of prompts, producer versions and generated image records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_or_create_prompt(&self, text: &str, creator: &str) -> Result<(PromptRecord, bool)>;

    async fn get_prompt(&self, id: i64) -> Result<Option<PromptRecord>>;

    async fn find_producer_version(&self, producer: GeneratorKind) -> Result<Option<ProducerVersion>>;

    async fn create_image_generation(&self, generation: NewImageGeneration) -> Result<ImageGenerationRecord>;

    async fn create_image_save(
        &self,
        image_generation_id: i64,
        save_type: ImageSaveType,
        file_path: &Path,
    ) -> Result<ImageSaveRecord>;

    async fn get_image_generation(&self, id: i64) -> Result<Option<ImageGenerationRecord>>;

    async fn image_saves_for(&self, image_generation_id: i64) -> Result<Vec<ImageSaveRecord>>;
}
