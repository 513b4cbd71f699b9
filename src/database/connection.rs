//! Database connection management
//!
//! The store runs on either a local SQLite file or a Postgres server, picked
//! from the connection string. Both go through sqlx's `Any` driver; only the
//! placeholder glyph and the DDL differ per backend.

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;
use crate::utils::errors::{AdhkarError, Result};

pub type DatabasePool = AnyPool;

/// SQL backend behind the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// Detect the backend from a normalized connection URL
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split("://").next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgresql" | "postgres" => Ok(Backend::Postgres),
            other => Err(AdhkarError::Config(format!("Unsupported database scheme {:?}", other))),
        }
    }

    /// Rewrite a statement written with `$1..$n` placeholders for this backend.
    ///
    /// Statements must reference every parameter once, in ascending order.
    pub fn render(&self, sql: &str) -> String {
        match self {
            Backend::Postgres => sql.to_string(),
            Backend::Sqlite => {
                let mut out = String::with_capacity(sql.len());
                let mut chars = sql.chars().peekable();
                while let Some(c) = chars.next() {
                    if c == '$' && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                        while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                            chars.next();
                        }
                        out.push('?');
                    } else {
                        out.push(c);
                    }
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: crate::config::validation::DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<(DatabasePool, Backend)> {
    sqlx::any::install_default_drivers();
    let backend = Backend::from_url(&config.url)?;

    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await
        .map_err(|e| AdhkarError::StoreUnavailable(e.to_string()))?;

    // Test the connection
    health_check(&pool).await?;

    tracing::info!(backend = ?backend, "Database connection pool created successfully");
    Ok((pool, backend))
}

/// Create tables if they do not exist yet
pub async fn run_migrations(pool: &DatabasePool, backend: Backend) -> Result<()> {
    tracing::info!("Running database migrations...");

    // SQLite decodes a declared INTEGER column as 32-bit, so ids and timestamps need BIGINT
    let (int, big) = match backend {
        Backend::Sqlite => ("INTEGER", "BIGINT"),
        Backend::Postgres => ("BIGINT", "BIGINT"),
    };

    let group_settings = format!(
        r#"
        CREATE TABLE IF NOT EXISTS group_settings (
            chat_id {big} PRIMARY KEY,
            enabled {int} NOT NULL DEFAULT 0,
            morning {int} NOT NULL DEFAULT 1,
            evening {int} NOT NULL DEFAULT 1,
            friday_kahf {int} NOT NULL DEFAULT 1,
            friday_dua {int} NOT NULL DEFAULT 1,
            sleep {int} NOT NULL DEFAULT 1,
            diverse {int} NOT NULL DEFAULT 1,
            morning_time TEXT NOT NULL DEFAULT '05:00',
            evening_time TEXT NOT NULL DEFAULT '17:00',
            sleep_time TEXT NOT NULL DEFAULT '22:00',
            diverse_interval_minutes {int} NOT NULL DEFAULT 60,
            diverse_media_type TEXT NOT NULL DEFAULT 'text',
            send_media_with_morning {int} NOT NULL DEFAULT 0,
            send_media_with_evening {int} NOT NULL DEFAULT 0,
            send_media_with_friday {int} NOT NULL DEFAULT 0,
            created_at {big} NOT NULL
        )
        "#
    );

    let group_admins = format!(
        r#"
        CREATE TABLE IF NOT EXISTS group_admins (
            chat_id {big} NOT NULL,
            user_id {big} NOT NULL,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            is_primary {int} NOT NULL DEFAULT 0,
            added_at {big} NOT NULL,
            UNIQUE (chat_id, user_id)
        )
        "#
    );

    let mut tx = pool.begin().await?;
    sqlx::query(&group_settings).execute(&mut *tx).await?;
    sqlx::query(&group_admins).execute(&mut *tx).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_group_settings_enabled ON group_settings (enabled)")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| AdhkarError::StoreUnavailable(e.to_string()))?;

    Ok(())
}
