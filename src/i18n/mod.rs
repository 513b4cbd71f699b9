//! Internationalization module
//!
//! Arabic interface strings for replies, the control panel and error
//! messages, loaded from a JSON file at startup.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams};

/// Build translation parameters from `(name, value)` pairs
pub fn params<const N: usize>(pairs: [(&str, String); N]) -> TranslationParams {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
