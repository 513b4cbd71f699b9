//! Content catalogue
//!
//! The catalogue is a JSON document keyed by category:
//!
//! ```json
//! { "morning": { "entries": ["..."], "batch_size": 3, "media": { "audio": ["https://..."] } } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use rand::seq::{index, SliceRandom};
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

use crate::config::ContentConfig;
use crate::models::{Category, GroupSettings, MediaType};
use crate::services::gateway::CAPTION_LIMIT;
use crate::utils::errors::{AdhkarError, Result};

/// Batch size of the multi-message categories when the file does not set one
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Attachment sent with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaType,
    pub url: String,
}

/// One message handed to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub body: String,
    pub media: Option<MediaRef>,
}

impl ContentItem {
    pub fn text(body: impl Into<String>) -> Self {
        Self { body: body.into(), media: None }
    }

    /// The platform messages this item is sent as.
    ///
    /// A body too long for a caption goes out as a bare attachment followed
    /// by a separate text message.
    pub fn parts(&self) -> Vec<ContentItem> {
        match &self.media {
            Some(media) if self.body.chars().count() > CAPTION_LIMIT => vec![
                ContentItem { body: String::new(), media: Some(media.clone()) },
                ContentItem::text(self.body.clone()),
            ],
            _ => vec![self.clone()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CategoryContent {
    entries: Vec<String>,
    #[serde(default)]
    batch_size: Option<usize>,
    #[serde(default)]
    media: HashMap<MediaType, Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    categories: HashMap<Category, CategoryContent>,
}

impl ContentCatalog {
    /// Load the catalogue file named in the configuration
    pub async fn load(config: &ContentConfig) -> Result<Self> {
        let path = Path::new(&config.path);
        let content = fs::read_to_string(path).await.map_err(|e| {
            AdhkarError::Config(format!("Content catalogue {} not readable: {}", path.display(), e))
        })?;

        let catalog = Self::from_json(&content)?;
        info!(
            entries = catalog.total_entries(),
            "Loaded content catalogue from {}",
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let categories: HashMap<Category, CategoryContent> = serde_json::from_str(content)?;
        for category in Category::ALL {
            if categories.get(&category).map_or(true, |c| c.entries.is_empty()) {
                debug!(category = %category, "Catalogue has no entries for category");
            }
        }
        Ok(Self { categories })
    }

    fn entries(&self, category: Category) -> Result<&CategoryContent> {
        self.categories
            .get(&category)
            .filter(|c| !c.entries.is_empty())
            .ok_or_else(|| AdhkarError::ContentMissing(category.to_string()))
    }

    /// A single message body.
    ///
    /// `friday_kahf` and `sleep` always yield their first entry; every other
    /// category is drawn uniformly at random.
    pub fn random(&self, category: Category) -> Result<String> {
        let content = self.entries(category)?;
        let body = match category {
            Category::FridayKahf | Category::Sleep => content.entries.first(),
            _ => content.entries.choose(&mut rand::thread_rng()),
        };

        body.cloned()
            .ok_or_else(|| AdhkarError::ContentMissing(category.to_string()))
    }

    /// Ordered bodies for one fire of `category`.
    ///
    /// Morning and evening draw `batch_size` distinct entries and emit them in
    /// catalogue order; the other categories yield one message.
    pub fn batch(&self, category: Category) -> Result<Vec<String>> {
        match category {
            Category::Morning | Category::Evening => {
                let content = self.entries(category)?;
                let size = content
                    .batch_size
                    .unwrap_or(DEFAULT_BATCH_SIZE)
                    .clamp(1, content.entries.len());

                let mut picked = index::sample(&mut rand::thread_rng(), content.entries.len(), size).into_vec();
                picked.sort_unstable();

                Ok(picked.into_iter().map(|i| content.entries[i].clone()).collect())
            }
            _ => Ok(vec![self.random(category)?]),
        }
    }

    /// Batch with attachments applied according to the group's media preferences.
    ///
    /// Only the first message carries media.
    pub fn batch_for(&self, category: Category, settings: &GroupSettings) -> Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self.batch(category)?.into_iter().map(ContentItem::text).collect();

        if settings.attaches_media(category) {
            let preferred = match category {
                Category::Diverse => Some(settings.diverse_media_type),
                _ => None,
            };
            if let (Some(first), Some(media)) = (items.first_mut(), self.media_for(category, preferred)) {
                first.media = Some(media);
            }
        }

        Ok(items)
    }

    /// A random media reference for `category`.
    ///
    /// With a preferred kind only that kind is considered; `text` never
    /// attaches. Without one the first kind that has references is used.
    pub fn media_for(&self, category: Category, preferred: Option<MediaType>) -> Option<MediaRef> {
        let content = self.categories.get(&category)?;
        let mut rng = rand::thread_rng();

        let kinds: Vec<MediaType> = match preferred {
            Some(MediaType::Text) => return None,
            Some(kind) => vec![kind],
            None => MediaType::ALL.into_iter().filter(|k| *k != MediaType::Text).collect(),
        };

        kinds.into_iter().find_map(|kind| {
            content
                .media
                .get(&kind)
                .and_then(|urls| urls.choose(&mut rng))
                .map(|url| MediaRef { kind, url: url.clone() })
        })
    }

    pub fn total_entries(&self) -> usize {
        self.categories.values().map(|c| c.entries.len()).sum()
    }
}
