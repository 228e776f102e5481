use crate::error::{ImageMakerError, Result};
use crate::models::image::{GenerateResponse, IdeogramDetails};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which image producer handled (or should handle) a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    Ideogram,
    #[serde(rename = "BFL")]
    Bfl,
    Midjourney,
    #[serde(rename = "De3")]
    Dalle3,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Ideogram => "Ideogram",
            GeneratorKind::Bfl => "BFL",
            GeneratorKind::Midjourney => "Midjourney",
            GeneratorKind::Dalle3 => "De3",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = ImageMakerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ideogram" => Ok(GeneratorKind::Ideogram),
            "bfl" => Ok(GeneratorKind::Bfl),
            "midjourney" => Ok(GeneratorKind::Midjourney),
            "de3" | "dalle3" => Ok(GeneratorKind::Dalle3),
            other => Err(ImageMakerError::ValidationError(format!(
                "Unknown generator: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptRewrite {
    pub source: String,
    pub original: String,
    pub rewrite: String,
}

/// The prompt as it travels through a generation, including any provider-side rewrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptDetails {
    pub prompt: String,
    #[serde(default)]
    pub ideogram_details: IdeogramDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_rewrite: Option<PromptRewrite>,
}

impl PromptDetails {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_ideogram_details(mut self, details: IdeogramDetails) -> Self {
        self.ideogram_details = details;
        self
    }

    /// Replaces the active prompt with the provider's text and records where it came from.
    pub fn apply_rewrite(&mut self, generator: GeneratorKind, returned_prompt: &str) {
        if returned_prompt == self.prompt {
            return;
        }
        let original = std::mem::replace(&mut self.prompt, returned_prompt.to_string());
        self.prompt_rewrite = Some(PromptRewrite {
            source: format!("{} rewrite", generator),
            original,
            rewrite: returned_prompt.to_string(),
        });
    }
}

/// Uniform outcome of one generation attempt, whatever the provider or failure origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub prompt_details: PromptDetails,
    pub generator: GeneratorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<GenerateResponse>,
}

impl GenerationResult {
    pub fn success(
        generator: GeneratorKind,
        url: String,
        prompt_details: PromptDetails,
        response: GenerateResponse,
    ) -> Self {
        Self {
            is_success: true,
            url: Some(url),
            error_message: None,
            prompt_details,
            generator,
            response: Some(response),
        }
    }

    pub fn failure(
        generator: GeneratorKind,
        error_message: impl Into<String>,
        prompt_details: PromptDetails,
    ) -> Self {
        Self {
            is_success: false,
            url: None,
            error_message: Some(error_message.into()),
            prompt_details,
            generator,
            response: None,
        }
    }
}

/// Counters shared by every call routed through one generation service.
#[derive(Debug, Default)]
pub struct GenerationStats {
    request_count: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    spend_micro_usd: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatsSnapshot {
    pub request_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub estimated_spend_usd: f64,
}

impl GenerationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_success(&self, price_usd: f64) {
        self.success_count.fetch_add(1, Ordering::SeqCst);
        let micro = (price_usd * 1_000_000.0).round() as u64;
        self.spend_micro_usd.fetch_add(micro, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            request_count: self.request_count.load(Ordering::SeqCst),
            success_count: self.success_count.load(Ordering::SeqCst),
            failure_count: self.failure_count.load(Ordering::SeqCst),
            estimated_spend_usd: self.spend_micro_usd.load(Ordering::SeqCst) as f64
                / 1_000_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_parsing() {
        assert_eq!("Ideogram".parse::<GeneratorKind>().unwrap(), GeneratorKind::Ideogram);
        assert_eq!("bfl".parse::<GeneratorKind>().unwrap(), GeneratorKind::Bfl);
        assert!("stable-diffusion".parse::<GeneratorKind>().is_err());
        assert_eq!(GeneratorKind::Dalle3.to_string(), "De3");
    }

    #[test]
    fn test_rewrite_annotation() {
        let mut details = PromptDetails::new("a red fox");
        details.apply_rewrite(GeneratorKind::Ideogram, "a red fox in snow");

        assert_eq!(details.prompt, "a red fox in snow");
        let rewrite = details.prompt_rewrite.unwrap();
        assert_eq!(rewrite.source, "Ideogram rewrite");
        assert_eq!(rewrite.original, "a red fox");
        assert_eq!(rewrite.rewrite, "a red fox in snow");
    }

    #[test]
    fn test_identical_prompt_is_not_a_rewrite() {
        let mut details = PromptDetails::new("a red fox");
        details.apply_rewrite(GeneratorKind::Ideogram, "a red fox");
        assert!(details.prompt_rewrite.is_none());
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = GenerationStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_success(0.08);
        stats.record_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.request_count, 2);
        assert_eq!(snap.success_count, 1);
        assert_eq!(snap.failure_count, 1);
        assert!((snap.estimated_spend_usd - 0.08).abs() < 1e-9);
    }
}
