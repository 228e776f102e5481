use imagemaker::{
    logger::{self, LogLevel, LoggerConfig},
    Config, Dispatcher, GeneratorKind, InMemoryRecordStore, SubmitRequest, TaskStatus,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = env::var("RUST_LOG")
        .map(|name| LogLevel::from_name(&name))
        .unwrap_or(LogLevel::Info);
    logger::init_with_config(LoggerConfig::development().with_level(level))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let records = Arc::new(InMemoryRecordStore::with_default_producers());
    let dispatcher = Dispatcher::from_config(&config, records).await?;

    let args: Vec<String> = env::args().skip(1).collect();

    #[cfg(feature = "server")]
    if args.first().map(String::as_str) == Some("serve") {
        imagemaker::server::run(dispatcher, config.port.unwrap_or(8080)).await?;
        return Ok(());
    }

    let prompt = args.join(" ");
    let caller = env::var("IMAGEMAKER_USER").unwrap_or_else(|_| "cli".to_string());

    let task_id = match dispatcher
        .submit(SubmitRequest::new(prompt, GeneratorKind::Ideogram), &caller)
        .await
    {
        Ok(task_id) => task_id,
        Err(e) => {
            log::error!("❌ Submission rejected: {}", e);
            return Err(e.into());
        }
    };
    log::info!("🚀 Submitted task {}", task_id);

    loop {
        match dispatcher.poll_status(&task_id).await? {
            TaskStatus::Processing => {
                log::info!("⏳ Task {} still processing", task_id);
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            TaskStatus::Success { image_id } => {
                log::info!("✅ Image {} saved under {}", image_id, config.media_root.display());
                break;
            }
            TaskStatus::Error { message } => {
                log::error!("❌ Generation failed: {}", message);
                break;
            }
        }
    }

    let stats = dispatcher.stats();
    log::info!(
        "📊 Requests: {}, succeeded: {}, failed: {}, estimated spend: ${:.2}",
        stats.request_count,
        stats.success_count,
        stats.failure_count,
        stats.estimated_spend_usd
    );

    Ok(())
}
