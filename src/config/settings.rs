//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from an optional TOML file and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub content: ContentConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// How the process receives platform updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    Polling,
    Webhook,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub mode: BotMode,
    /// Public base URL of the webhook listener, without the token path
    pub webhook_url: Option<String>,
}

/// Where the effective listener port came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortSource {
    Env,
    #[default]
    Default,
}

/// Webhook listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: i64,
    #[serde(default)]
    pub port_source: PortSource,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Raw connection string; `None` selects the local SQLite file
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Scheduler tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Pause between successive messages of one batch
    pub pacing_ms: u64,
    /// Concurrent fires
    pub workers: usize,
    pub max_rate_limit_retries: u32,
    pub transient_retries: u32,
    pub transient_backoff_ms: u64,
}

/// Content catalogue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    pub path: String,
}

/// Interface strings configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily-rolling log files; stdout only when unset
    pub directory: Option<String>,
}

/// Default port of the webhook listener
pub const DEFAULT_PORT: i64 = 5000;

impl Settings {
    /// Load settings from configuration file and process environment
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load settings reading well-known variables through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT").filter(|p| !p.trim().is_empty());
        let port_source = if port.is_some() { PortSource::Env } else { PortSource::Default };

        let webhook_url = lookup("WEBHOOK_URL").or_else(|| {
            lookup("RENDER_EXTERNAL_HOSTNAME")
                .filter(|host| !host.trim().is_empty())
                .map(|host| format!("https://{}", host.trim()))
        });

        let settings = config::Config::builder()
            .set_default("bot.token", "")?
            .set_default("bot.mode", "polling")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", DEFAULT_PORT)?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("scheduler.pacing_ms", 1500)?
            .set_default("scheduler.workers", 4)?
            .set_default("scheduler.max_rate_limit_retries", 5)?
            .set_default("scheduler.transient_retries", 3)?
            .set_default("scheduler.transient_backoff_ms", 2000)?
            .set_default("content.path", "content/adhkar.json")?
            .set_default("i18n.path", "translations/ar.json")?
            .set_default("logging.level", "info")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("ADHKAR").separator("__"))
            .set_override_option("bot.token", lookup("BOT_TOKEN"))?
            .set_override_option("bot.mode", lookup("BOT_MODE").map(|m| m.trim().to_lowercase()))?
            .set_override_option("bot.webhook_url", webhook_url)?
            .set_override_option("server.port", port.map(|p| p.trim().to_string()))?
            .set_override_option("database.url", lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()))?
            .set_override_option("logging.level", lookup("LOG_LEVEL"))?
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        settings.server.port_source = port_source;
        Ok(settings)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::AdhkarError> {
        super::validation::validate_settings(self)
    }

    /// Effective listener port; only meaningful after [`Settings::validate`]
    pub fn port(&self) -> u16 {
        u16::try_from(self.server.port).unwrap_or(DEFAULT_PORT as u16)
    }

    /// Normalized database URL
    pub fn database_url(&self) -> Result<String, crate::utils::errors::AdhkarError> {
        super::validation::normalize_database_url(self.database.url.as_deref())
    }

    /// Webhook URL the platform should be pointed at (`<base>/<token>`)
    pub fn expected_webhook_url(&self) -> Option<String> {
        self.bot
            .webhook_url
            .as_ref()
            .map(|base| webhook_url_for(base, &self.bot.token))
    }
}

/// Compose the webhook URL for a base address
pub fn webhook_url_for(base: &str, token: &str) -> String {
    format!("{}/{}", base.trim().trim_end_matches('/'), token)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                mode: BotMode::Polling,
                webhook_url: None,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                port_source: PortSource::Default,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                min_connections: 1,
            },
            scheduler: SchedulerConfig {
                pacing_ms: 1500,
                workers: 4,
                max_rate_limit_retries: 5,
                transient_retries: 3,
                transient_backoff_ms: 2000,
            },
            content: ContentConfig {
                path: "content/adhkar.json".to_string(),
            },
            i18n: I18nConfig {
                path: "translations/ar.json".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}
