use crate::models::common::GeneratorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptRecord {
    pub id: i64,
    pub text: String,
    pub creator: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProducerVersion {
    pub id: i64,
    pub producer: GeneratorKind,
    pub version: String,
}

/// Values for a new generation record; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewImageGeneration {
    pub user: String,
    pub prompt_id: i64,
    /// Prompt text actually used by the provider, after any rewrite.
    pub prompt_text: String,
    pub producer_version_id: i64,
    pub details: serde_json::Value,
    pub uri: String,
    pub result: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageGenerationRecord {
    pub id: i64,
    pub user: String,
    pub prompt_id: i64,
    pub prompt_text: String,
    pub producer_version_id: i64,
    pub details: serde_json::Value,
    pub uri: String,
    pub result: serde_json::Value,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageSaveType {
    Raw,
    FullAnnotation,
    InitialIdea,
    FinalPrompt,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSaveRecord {
    pub id: i64,
    pub image_generation_id: i64,
    pub save_type: ImageSaveType,
    pub file_path: PathBuf,
    pub created: DateTime<Utc>,
}
