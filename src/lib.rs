//! Bounded-concurrency image generation against Ideogram, with fire-and-forget
//! dispatch and polled task results.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod ideogram;
pub mod logger;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{Config, IdeogramConfig, UpstashConfig};
pub use dispatch::{Dispatcher, ImageDownloader, SubmitRequest};
pub use error::{ImageMakerError, Result};
pub use ideogram::{IdeogramClient, IdeogramService, ImageGenerationService, ImageProvider};
pub use models::*;
pub use storage::{InMemoryRecordStore, InMemoryResultStore, RecordStore, ResultStore};
