//! AdhkarBot Telegram Bot
//!
//! Posts scheduled adhkar (morning and evening remembrances, Friday
//! reminders, bedtime supplications and rotating diverse content) into
//! group chats. Group administrators configure the schedule through
//! commands and an inline control panel; settings persist in SQLite or
//! Postgres and a timeline scheduler delivers content in Riyadh time.

#![allow(non_snake_case)]

pub mod config;
pub mod content;
pub mod database;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AdhkarError, Result};

// Re-export main components for easy access
pub use content::ContentCatalog;
pub use database::SettingsStore;
pub use i18n::I18n;
pub use scheduler::Scheduler;
pub use services::AppContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
