//! Error handling for AdhkarBot
//!
//! This module defines the main error type used throughout the application
//! and maps each failure to the concise Arabic text shown to administrators.

use thiserror::Error;
use crate::i18n::I18n;

/// Main error type for AdhkarBot application
#[derive(Error, Debug)]
pub enum AdhkarError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid settings field: {0}")]
    InvalidField(String),

    #[error("Invalid value {value:?} for field {field}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid time: {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid interval: {0} (expected 1..=1440 minutes)")]
    InvalidInterval(i64),

    #[error("User {user_id} is not an administrator of chat {chat_id}")]
    NotAdmin { chat_id: i64, user_id: i64 },

    #[error("No content available for category {0}")]
    ContentMissing(String),

    #[error("Settings store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for AdhkarBot operations
pub type Result<T> = std::result::Result<T, AdhkarError>;

impl From<config::ConfigError> for AdhkarError {
    fn from(err: config::ConfigError) -> Self {
        AdhkarError::Config(err.to_string())
    }
}

impl AdhkarError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            AdhkarError::Database(_) => true,
            AdhkarError::Telegram(_) => true,
            AdhkarError::StoreUnavailable(_) => true,
            AdhkarError::Io(_) => true,
            AdhkarError::Config(_) => false,
            AdhkarError::InvalidField(_) => false,
            AdhkarError::InvalidValue { .. } => false,
            AdhkarError::InvalidTime(_) => false,
            AdhkarError::InvalidInterval(_) => false,
            AdhkarError::NotAdmin { .. } => false,
            AdhkarError::ContentMissing(_) => false,
            AdhkarError::Serialization(_) => false,
            AdhkarError::UrlParse(_) => false,
            AdhkarError::Internal(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdhkarError::Database(_) => ErrorSeverity::Critical,
            AdhkarError::StoreUnavailable(_) => ErrorSeverity::Critical,
            AdhkarError::Config(_) => ErrorSeverity::Critical,
            AdhkarError::NotAdmin { .. } => ErrorSeverity::Warning,
            AdhkarError::ContentMissing(_) => ErrorSeverity::Warning,
            AdhkarError::InvalidField(_)
            | AdhkarError::InvalidValue { .. }
            | AdhkarError::InvalidTime(_)
            | AdhkarError::InvalidInterval(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Translation key of the message shown to the user for this error
    pub fn message_key(&self) -> &'static str {
        match self {
            AdhkarError::InvalidField(_) => "errors.invalid_field",
            AdhkarError::InvalidValue { .. } => "errors.invalid_value",
            AdhkarError::InvalidTime(_) => "errors.invalid_time",
            AdhkarError::InvalidInterval(_) => "errors.invalid_interval",
            AdhkarError::NotAdmin { .. } => "errors.not_admin",
            AdhkarError::ContentMissing(_) => "errors.content_missing",
            AdhkarError::Database(_) | AdhkarError::StoreUnavailable(_) => "errors.store_unavailable",
            _ => "errors.internal",
        }
    }

    /// Arabic human-readable message for command replies
    pub fn user_message(&self, i18n: &I18n) -> String {
        i18n.t(self.message_key(), None)
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
