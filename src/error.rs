use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageMakerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("API request failed with status code {status}. Response: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Provider response error: {0}")]
    ProviderResponse(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Multiple images returned for a single-image request ({0} images)")]
    UnexpectedMultiImage(usize),

    #[error("Image generation failed: {0}")]
    GenerationFailed(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Failed to download image: {0}")]
    DownloadError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ImageMakerError {
    /// True for the errors a caller sees at submission time, before any background work.
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            ImageMakerError::ValidationError(_) | ImageMakerError::NotFoundError(_)
        )
    }

    /// True for the errors that stand for a failed provider exchange.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            ImageMakerError::ProviderStatus { .. }
                | ImageMakerError::ProviderResponse(_)
                | ImageMakerError::RequestError(_)
        )
    }
}

impl From<serde_json::Error> for ImageMakerError {
    fn from(e: serde_json::Error) -> Self {
        ImageMakerError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImageMakerError>;
