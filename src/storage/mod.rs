pub mod memory;
pub mod traits;
pub mod upstash;

use crate::{config::Config, error::Result};
use std::sync::Arc;
use traits::ResultStore as ResultStoreBackend;

#[cfg(feature = "upstash")]
use upstash::UpstashResultStore;

pub use memory::{InMemoryRecordStore, InMemoryResultStore};
pub use traits::{RecordStore, ResultStore};

/// Picks the task-result backend named by the configuration.
pub struct ResultStoreManager {
    backend: Arc<dyn ResultStoreBackend>,
}

impl ResultStoreManager {
    pub async fn new(config: &Config) -> Result<Self> {
        let backend: Arc<dyn ResultStoreBackend> = if config.use_upstash {
            #[cfg(feature = "upstash")]
            {
                let upstash_config = config.upstash.clone().ok_or_else(|| {
                    crate::error::ImageMakerError::ConfigError("Upstash config required".into())
                })?;
                Arc::new(UpstashResultStore::new(upstash_config).await?)
            }
            #[cfg(not(feature = "upstash"))]
            {
                return Err(crate::error::ImageMakerError::ConfigError(
                    "Upstash feature not enabled".into(),
                ));
            }
        } else {
            log::info!("Using in-memory task result store");
            Arc::new(InMemoryResultStore::new())
        };

        Ok(Self { backend })
    }

    pub fn store(&self) -> Arc<dyn ResultStoreBackend> {
        Arc::clone(&self.backend)
    }
}
