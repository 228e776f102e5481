use crate::{
    error::Result,
    models::{
        GeneratorKind, ImageGenerationRecord, ImageSaveRecord, ImageSaveType, NewImageGeneration,
        ProducerVersion, PromptRecord,
    },
    storage::traits::{RecordStore, ResultStore},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Process-local result store. Expired entries read as absent and are swept on every write.
#[derive(Default)]
pub struct InMemoryResultStore {
    entries: RwLock<HashMap<String, (serde_json::Value, Instant)>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires)) if *expires > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if matches!(entries.get(key), Some((_, expires)) if *expires <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

#[derive(Default)]
struct Tables {
    prompts: Vec<PromptRecord>,
    producer_versions: Vec<ProducerVersion>,
    generations: Vec<ImageGenerationRecord>,
    saves: Vec<ImageSaveRecord>,
}

/// Record store backed by in-process tables with sequential ids.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with an "Ideogram 2.0" producer version registered.
    pub fn with_default_producers() -> Self {
        let tables = Tables {
            producer_versions: vec![ProducerVersion {
                id: 1,
                producer: GeneratorKind::Ideogram,
                version: "2.0".to_string(),
            }],
            ..Default::default()
        };
        Self {
            tables: Mutex::new(tables),
        }
    }

    pub async fn register_producer(&self, producer: GeneratorKind, version: impl Into<String>) -> ProducerVersion {
        let mut tables = self.tables.lock().await;
        let record = ProducerVersion {
            id: tables.producer_versions.len() as i64 + 1,
            producer,
            version: version.into(),
        };
        tables.producer_versions.push(record.clone());
        record
    }

    pub async fn image_generations(&self) -> Vec<ImageGenerationRecord> {
        self.tables.lock().await.generations.clone()
    }

    pub async fn image_saves(&self) -> Vec<ImageSaveRecord> {
        self.tables.lock().await.saves.clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_or_create_prompt(&self, text: &str, creator: &str) -> Result<(PromptRecord, bool)> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .prompts
            .iter()
            .find(|p| p.text == text && p.creator == creator)
        {
            return Ok((existing.clone(), false));
        }

        let record = PromptRecord {
            id: tables.prompts.len() as i64 + 1,
            text: text.to_string(),
            creator: creator.to_string(),
            created: Utc::now(),
        };
        tables.prompts.push(record.clone());
        Ok((record, true))
    }

    async fn get_prompt(&self, id: i64) -> Result<Option<PromptRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.prompts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_producer_version(&self, producer: GeneratorKind) -> Result<Option<ProducerVersion>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .producer_versions
            .iter()
            .find(|v| v.producer == producer)
            .cloned())
    }

    async fn create_image_generation(&self, generation: NewImageGeneration) -> Result<ImageGenerationRecord> {
        let mut tables = self.tables.lock().await;
        let record = ImageGenerationRecord {
            id: tables.generations.len() as i64 + 1,
            user: generation.user,
            prompt_id: generation.prompt_id,
            prompt_text: generation.prompt_text,
            producer_version_id: generation.producer_version_id,
            details: generation.details,
            uri: generation.uri,
            result: generation.result,
            created: Utc::now(),
        };
        tables.generations.push(record.clone());
        Ok(record)
    }

    async fn create_image_save(
        &self,
        image_generation_id: i64,
        save_type: ImageSaveType,
        file_path: &Path,
    ) -> Result<ImageSaveRecord> {
        let mut tables = self.tables.lock().await;
        let record = ImageSaveRecord {
            id: tables.saves.len() as i64 + 1,
            image_generation_id,
            save_type,
            file_path: file_path.to_path_buf(),
            created: Utc::now(),
        };
        tables.saves.push(record.clone());
        Ok(record)
    }

    async fn get_image_generation(&self, id: i64) -> Result<Option<ImageGenerationRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.generations.iter().find(|g| g.id == id).cloned())
    }

    async fn image_saves_for(&self, image_generation_id: i64) -> Result<Vec<ImageSaveRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .saves
            .iter()
            .filter(|s| s.image_generation_id == image_generation_id)
            .cloned()
            .collect())
    }
}
