use crate::error::{ImageMakerError, Result};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};

pub const GENERATED_IMAGES_DIR: &str = "generated_images";

/// Fetches generated images and writes them under `<media_root>/generated_images`.
pub struct ImageDownloader {
    client: Client,
    media_root: PathBuf,
}

impl ImageDownloader {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            media_root: media_root.into(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn path_for(&self, generation_id: i64) -> PathBuf {
        self.media_root
            .join(GENERATED_IMAGES_DIR)
            .join(format!("generated_image_{}.png", generation_id))
    }

    pub async fn download_and_save(&self, url: &str, generation_id: i64) -> Result<PathBuf> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageMakerError::DownloadError(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ImageMakerError::DownloadError(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageMakerError::DownloadError(format!("{}: {}", url, e)))?;

        let file_path = self.path_for(generation_id);
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ImageMakerError::StorageError(e.to_string()))?;
        }
        tokio::fs::write(&file_path, &bytes)
            .await
            .map_err(|e| ImageMakerError::StorageError(e.to_string()))?;

        log::info!("Saved {} bytes to {}", bytes.len(), file_path.display());
        Ok(file_path)
    }
}
