//! Platform gateway
//!
//! Sends one content item to a chat and classifies the result so the
//! scheduler can decide between retrying, backing off and demoting the group.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::RequestError;
use tracing::{info, warn};
use url::Url;

use crate::content::{ContentItem, MediaRef};
use crate::models::{Category, MediaType};

/// Platform limit on media captions, in characters
pub const CAPTION_LIMIT: usize = 1024;

/// Global flood limit of the platform, messages per second
const SENDS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(30) {
    Some(n) => n,
    None => panic!("send rate must be non-zero"),
};

/// Classified result of one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Ok,
    RateLimited(Duration),
    Blocked,
    Kicked,
    ChatNotFound,
    Forbidden(String),
    Transient(String),
    Rejected(String),
}

impl DeliveryOutcome {
    /// Label used in the `REASON=` suffix of send log lines
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Ok => "ok",
            DeliveryOutcome::RateLimited(_) => "rate_limited",
            DeliveryOutcome::Blocked => "blocked",
            DeliveryOutcome::Kicked => "kicked",
            DeliveryOutcome::ChatNotFound => "chat_not_found",
            DeliveryOutcome::Forbidden(_) => "forbidden",
            DeliveryOutcome::Transient(_) => "transient",
            DeliveryOutcome::Rejected(_) => "rejected",
        }
    }

    /// Outcomes after which the group must be disabled
    pub fn disables_group(&self) -> bool {
        matches!(
            self,
            DeliveryOutcome::Blocked | DeliveryOutcome::Kicked | DeliveryOutcome::ChatNotFound
        )
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::RateLimited(after) => write!(f, "rate_limited({}s)", after.as_secs()),
            DeliveryOutcome::Forbidden(detail)
            | DeliveryOutcome::Transient(detail)
            | DeliveryOutcome::Rejected(detail) => write!(f, "{}({})", self.label(), detail),
            other => f.write_str(other.label()),
        }
    }
}

/// Delivery seam between the scheduler and the messaging platform
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, chat_id: i64, category: Category, item: &ContentItem) -> DeliveryOutcome;
}

/// Log the fixed send line for one attempt
pub fn log_attempt(chat_id: i64, category: Category, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Ok => {
            info!("Attempted to send adhkar for category={} chat_id={}", category, chat_id)
        }
        failure => warn!(
            detail = %failure,
            "Attempted to send adhkar for category={} chat_id={} REASON={}",
            category,
            chat_id,
            failure.label()
        ),
    }
}

/// Gateway backed by the Telegram Bot API
pub struct TelegramGateway {
    bot: Bot,
    limiter: DefaultDirectRateLimiter,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            limiter: RateLimiter::direct(Quota::per_second(SENDS_PER_SECOND)),
        }
    }

    /// Send one platform message.
    ///
    /// Items are expected to be split with [`ContentItem::parts`] first; an
    /// oversized caption is cut at the platform limit.
    async fn deliver(&self, chat: ChatId, item: &ContentItem) -> Result<(), RequestError> {
        let Some(media) = &item.media else {
            self.bot.send_message(chat, item.body.clone()).await?;
            return Ok(());
        };

        let caption = (!item.body.is_empty()).then(|| item.body.chars().take(CAPTION_LIMIT).collect());
        self.send_media(chat, media, caption).await
    }

    async fn send_media(&self, chat: ChatId, media: &MediaRef, caption: Option<String>) -> Result<(), RequestError> {
        // Anything that is not a URL is taken as a platform file id
        let file = match Url::parse(&media.url) {
            Ok(url) => InputFile::url(url),
            Err(_) => InputFile::file_id(media.url.clone()),
        };

        match (media.kind, caption) {
            (MediaType::Image, Some(c)) => self.bot.send_photo(chat, file).caption(c).await.map(drop),
            (MediaType::Image, None) => self.bot.send_photo(chat, file).await.map(drop),
            (MediaType::Audio, Some(c)) => self.bot.send_audio(chat, file).caption(c).await.map(drop),
            (MediaType::Audio, None) => self.bot.send_audio(chat, file).await.map(drop),
            (MediaType::Video, Some(c)) => self.bot.send_video(chat, file).caption(c).await.map(drop),
            (MediaType::Video, None) => self.bot.send_video(chat, file).await.map(drop),
            (MediaType::Document | MediaType::Text, Some(c)) => {
                self.bot.send_document(chat, file).caption(c).await.map(drop)
            }
            (MediaType::Document | MediaType::Text, None) => self.bot.send_document(chat, file).await.map(drop),
        }
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send(&self, chat_id: i64, category: Category, item: &ContentItem) -> DeliveryOutcome {
        self.limiter.until_ready().await;

        let outcome = match self.deliver(ChatId(chat_id), item).await {
            Ok(()) => DeliveryOutcome::Ok,
            Err(err) => classify_request_error(&err),
        };

        log_attempt(chat_id, category, &outcome);
        outcome
    }
}

/// Map a Bot API failure onto a delivery outcome
pub fn classify_request_error(err: &RequestError) -> DeliveryOutcome {
    match err {
        RequestError::RetryAfter(after) => DeliveryOutcome::RateLimited(after.duration()),
        RequestError::Api(api) => classify_api_description(&api.to_string()),
        RequestError::MigrateToChatId(new_id) => {
            warn!(new_chat_id = new_id.0, "Group was upgraded to a supergroup under a new chat id");
            DeliveryOutcome::ChatNotFound
        }
        RequestError::Network(e) => DeliveryOutcome::Transient(e.to_string()),
        RequestError::Io(e) => DeliveryOutcome::Transient(e.to_string()),
        other => DeliveryOutcome::Rejected(other.to_string()),
    }
}

/// Classify the description text of an API error
pub fn classify_api_description(description: &str) -> DeliveryOutcome {
    let lower = description.to_lowercase();

    if lower.contains("blocked") {
        DeliveryOutcome::Blocked
    } else if lower.contains("kicked") || lower.contains("not a member") {
        DeliveryOutcome::Kicked
    } else if lower.contains("chat not found")
        || lower.contains("deactivated")
        || lower.contains("upgraded to a supergroup")
    {
        DeliveryOutcome::ChatNotFound
    } else if lower.contains("forbidden") || lower.contains("not enough rights") || lower.contains("have no rights") {
        DeliveryOutcome::Forbidden(description.to_string())
    } else if lower.contains("internal server error") || lower.contains("bad gateway") || lower.contains("timeout") {
        DeliveryOutcome::Transient(description.to_string())
    } else {
        DeliveryOutcome::Rejected(description.to_string())
    }
}
