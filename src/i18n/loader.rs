//! Translation loader
//!
//! Keys are dotted paths into a nested JSON document
//! (`"panel.title"`), and `{name}` placeholders are substituted from
//! [`TranslationParams`].

use std::collections::HashMap;
use std::path::Path;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};
use crate::config::I18nConfig;
use crate::utils::errors::{AdhkarError, Result};

/// Interface strings
#[derive(Debug, Clone, Default)]
pub struct I18n {
    translations: Map<String, Value>,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Load the translation file named in the configuration
    pub async fn load(config: &I18nConfig) -> Result<Self> {
        let path = Path::new(&config.path);
        let content = fs::read_to_string(path).await.map_err(|e| {
            AdhkarError::Config(format!("Translation file {} not readable: {}", path.display(), e))
        })?;

        let i18n = Self::from_json(&content)?;
        info!("Loaded {} translation keys from {}", i18n.key_count(), path.display());
        Ok(i18n)
    }

    /// Parse translations from a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        match serde_json::from_str(content)? {
            Value::Object(translations) => {
                let i18n = Self { translations };
                debug!("Parsed {} translation keys", i18n.key_count());
                Ok(i18n)
            }
            _ => Err(AdhkarError::Config("Invalid translation file format".to_string())),
        }
    }

    /// Get a translated message; unknown keys come back verbatim
    pub fn t(&self, key: &str, params: Option<&TranslationParams>) -> String {
        match self.lookup(key) {
            Some(Value::String(text)) => Self::format_message(text, params),
            Some(other) => Self::format_message(&other.to_string(), params),
            None => {
                warn!("Translation key '{}' not found", key);
                key.to_string()
            }
        }
    }

    /// Whether a key resolves to a value
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut current = self.translations.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn format_message(template: &str, params: Option<&TranslationParams>) -> String {
        let Some(params) = params else {
            return template.to_string();
        };

        params.iter().fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{}}}", key), value)
        })
    }

    /// Number of leaf keys
    pub fn key_count(&self) -> usize {
        fn count(obj: &Map<String, Value>) -> usize {
            obj.values()
                .map(|value| match value {
                    Value::Object(nested) => count(nested),
                    _ => 1,
                })
                .sum()
        }
        count(&self.translations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "panel": { "title": "لوحة التحكم", "interval": "كل {minutes} دقيقة" },
        "help": "مساعدة"
    }"#;

    #[test]
    fn test_nested_keys_resolve() {
        let i18n = I18n::from_json(SAMPLE).unwrap();
        assert_eq!(i18n.t("panel.title", None), "لوحة التحكم");
        assert_eq!(i18n.t("help", None), "مساعدة");
        assert_eq!(i18n.key_count(), 3);
    }

    #[test]
    fn test_missing_key_falls_back_to_key() {
        let i18n = I18n::from_json(SAMPLE).unwrap();
        assert_eq!(i18n.t("panel.missing", None), "panel.missing");
        assert!(!i18n.contains("nope"));
    }

    #[test]
    fn test_message_formatting() {
        let i18n = I18n::from_json(SAMPLE).unwrap();
        let params = crate::i18n::params([("minutes", "30".to_string())]);
        assert_eq!(i18n.t("panel.interval", Some(&params)), "كل 30 دقيقة");
    }

    #[test]
    fn test_shipped_translations_cover_error_keys() {
        let i18n = I18n::from_json(include_str!("../../translations/ar.json")).unwrap();
        for key in [
            "errors.invalid_field",
            "errors.invalid_value",
            "errors.invalid_time",
            "errors.invalid_interval",
            "errors.not_admin",
            "errors.content_missing",
            "errors.store_unavailable",
            "errors.internal",
        ] {
            assert!(i18n.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_rejects_non_object_document() {
        assert!(I18n::from_json("[1, 2]").is_err());
    }
}
