//! Logging configuration for ragquery

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::AppConfig;
use crate::Result;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "ragquery.log";

/// Initialize logging with configuration; `RUST_LOG` wins over `logging.level`
pub fn init_logging_with_config(config: &AppConfig) -> Result<()> {
    let level = config.logging.level.as_str();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level));

    init_registry(env_filter)?;

    tracing::info!("Logging initialized with level: {} - console and file output enabled", level);
    tracing::info!("Log files will be saved to: {}/{}.YYYY-MM-DD", LOG_DIR, LOG_FILE);

    Ok(())
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<()> {
    init_registry(level_filter(level))?;

    tracing::info!("Logging initialized with level: {} - console and file output enabled", level);
    Ok(())
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},ragquery={level}"))
}

fn init_registry(env_filter: EnvFilter) -> Result<()> {
    let logs_dir = Path::new(LOG_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::RagError::Internal(format!("Failed to initialize logging: {e}")))?;

    // The writer thread must outlive every log call
    std::mem::forget(guard);

    Ok(())
}
