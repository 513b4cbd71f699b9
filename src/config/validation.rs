//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{AdhkarError, Result};
use super::{BotMode, Settings};

/// Local database used when no connection string is configured
pub const DEFAULT_DATABASE_URL: &str = "sqlite://adhkar_bot.db?mode=rwc";

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_scheduler_config(&settings.scheduler)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.trim().is_empty() {
        return Err(AdhkarError::Config(
            "BOT_TOKEN is required".to_string()
        ));
    }

    if config.mode == BotMode::Webhook {
        if let Some(base) = &config.webhook_url {
            url::Url::parse(base)?;
        }
    }

    Ok(())
}

/// Validate webhook listener configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    validate_port(config.port)?;
    Ok(())
}

/// A listener port must lie in `[1, 65535]`
pub fn validate_port(port: i64) -> Result<u16> {
    if (1..=65535).contains(&port) {
        Ok(port as u16)
    } else {
        Err(AdhkarError::Config(format!(
            "PORT must be between 1 and 65535, got {}",
            port
        )))
    }
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    normalize_database_url(config.url.as_deref())?;

    if config.max_connections == 0 {
        return Err(AdhkarError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AdhkarError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Normalize a raw `DATABASE_URL`.
///
/// Bare tokens are rejected instead of being treated as a SQLite file name.
/// `postgres://` and `psql://` become `postgresql://`; a libpq `key=value`
/// string is converted into the equivalent `postgresql://` URL.
pub fn normalize_database_url(raw: Option<&str>) -> Result<String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_DATABASE_URL.to_string()),
        Some(raw) => raw,
    };

    if raw.contains("://") {
        for legacy in ["postgres://", "psql://"] {
            if let Some(rest) = raw.strip_prefix(legacy) {
                return Ok(format!("postgresql://{}", rest));
            }
        }
        return Ok(raw.to_string());
    }

    if raw.contains('=') {
        return key_value_to_url(raw);
    }

    Err(AdhkarError::Config(format!(
        "DATABASE_URL {:?} is neither a URL nor a key=value connection string",
        raw
    )))
}

fn key_value_to_url(raw: &str) -> Result<String> {
    let mut host = "localhost".to_string();
    let mut port = None;
    let mut dbname = None;
    let mut user = None;
    let mut password = None;
    let mut params = Vec::new();

    for pair in raw.split_whitespace() {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            AdhkarError::Config(format!("Malformed DATABASE_URL segment {:?}", pair))
        })?;
        let value = value.trim_matches('\'');
        match key {
            "host" | "hostaddr" => host = value.to_string(),
            "port" => port = Some(value.to_string()),
            "dbname" => dbname = Some(value.to_string()),
            "user" => user = Some(value.to_string()),
            "password" => password = Some(value.to_string()),
            other => params.push(format!("{}={}", other, value)),
        }
    }

    let mut url = url::Url::parse("postgresql://localhost")?;
    url.set_host(Some(&host))?;
    if let Some(port) = port {
        let port = port
            .parse::<u16>()
            .map_err(|_| AdhkarError::Config(format!("Invalid database port {:?}", port)))?;
        url.set_port(Some(port))
            .map_err(|_| AdhkarError::Config(format!("Database host {:?} cannot carry a port", host)))?;
    }
    if let Some(user) = user {
        url.set_username(&user)
            .map_err(|_| AdhkarError::Config(format!("Database host {:?} cannot carry a user", host)))?;
    }
    if password.is_some() {
        url.set_password(password.as_deref())
            .map_err(|_| AdhkarError::Config(format!("Database host {:?} cannot carry a password", host)))?;
    }
    if let Some(dbname) = dbname {
        url.set_path(&dbname);
    }
    if !params.is_empty() {
        url.set_query(Some(&params.join("&")));
    }

    Ok(url.to_string())
}

/// Validate scheduler configuration
fn validate_scheduler_config(config: &super::SchedulerConfig) -> Result<()> {
    if config.workers == 0 {
        return Err(AdhkarError::Config(
            "Scheduler needs at least one worker".to_string()
        ));
    }

    if config.pacing_ms > 60_000 {
        return Err(AdhkarError::Config(
            "Message pacing cannot exceed one minute".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AdhkarError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AdhkarError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
