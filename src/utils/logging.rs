//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the AdhkarBot application.

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{AdhkarError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer and must be held until shutdown.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| AdhkarError::Config(format!("Invalid log filter: {}", e)))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "adhkar-bot.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| AdhkarError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log admin actions
pub fn log_admin_action(chat_id: i64, admin_id: i64, action: &str, details: Option<&str>) {
    info!(
        chat_id = chat_id,
        admin_id = admin_id,
        action = action,
        details = details,
        "Admin action performed"
    );
}

/// Log group lifecycle events
pub fn log_group_event(chat_id: i64, event: &str, details: Option<&str>) {
    info!(
        chat_id = chat_id,
        event = event,
        details = details,
        "Group event occurred"
    );
}

/// Log a group demoted to disabled by a delivery failure
pub fn log_group_demoted(chat_id: i64, reason: &str) {
    warn!(
        chat_id = chat_id,
        reason = reason,
        "Group disabled after persistent delivery failure"
    );
}
