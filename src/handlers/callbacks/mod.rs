//! Callback query handlers
//!
//! Inline-button data is a short `prefix:group:args` string decoded into a
//! [`PanelAction`].

use std::sync::Arc;

use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, info, warn};

use crate::handlers::panel;
use crate::models::{FieldKind, GroupSettings, MediaType, SettingField, TimeSlot};
use crate::services::{AppContext, Mutation};
use crate::utils::errors::Result;
use crate::utils::helpers::{format_hhmm, parse_hhmm};

/// Decoded inline-button action; every arm names its target group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    /// `tg:<g>:<field>`
    Toggle { group_id: i64, field: SettingField },
    /// `mt:<g>:<media>`
    Media { group_id: i64, media: MediaType },
    /// `iv:<g>:<minutes>`
    Interval { group_id: i64, minutes: i64 },
    /// `tm:<g>:<slot>:<HHMM>`
    Time { group_id: i64, slot: TimeSlot, time: String },
    /// `pn:<g>`
    Refresh { group_id: i64 },
    /// `cl:<g>`
    Close { group_id: i64 },
}

impl PanelAction {
    pub fn group_id(&self) -> i64 {
        match self {
            PanelAction::Toggle { group_id, .. }
            | PanelAction::Media { group_id, .. }
            | PanelAction::Interval { group_id, .. }
            | PanelAction::Time { group_id, .. }
            | PanelAction::Refresh { group_id }
            | PanelAction::Close { group_id } => *group_id,
        }
    }

    /// Callback data for this action
    pub fn encode(&self) -> String {
        match self {
            PanelAction::Toggle { group_id, field } => format!("tg:{}:{}", group_id, field.column()),
            PanelAction::Media { group_id, media } => format!("mt:{}:{}", group_id, media.as_str()),
            PanelAction::Interval { group_id, minutes } => format!("iv:{}:{}", group_id, minutes),
            PanelAction::Time { group_id, slot, time } => {
                format!("tm:{}:{}:{}", group_id, slot.as_str(), time.replace(':', ""))
            }
            PanelAction::Refresh { group_id } => format!("pn:{}", group_id),
            PanelAction::Close { group_id } => format!("cl:{}", group_id),
        }
    }

    /// Decode callback data; anything malformed yields `None`
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let prefix = parts.next()?;
        let group_id = parts.next()?.parse::<i64>().ok()?;
        let args: Vec<&str> = parts.collect();

        let action = match (prefix, args.as_slice()) {
            ("tg", [field]) => {
                let field = field.parse::<SettingField>().ok()?;
                if field.kind() != FieldKind::Flag {
                    return None;
                }
                PanelAction::Toggle { group_id, field }
            }
            ("mt", [media]) => PanelAction::Media { group_id, media: media.parse().ok()? },
            ("iv", [minutes]) => PanelAction::Interval { group_id, minutes: minutes.parse().ok()? },
            ("tm", [slot, hhmm]) if hhmm.len() == 4 && hhmm.is_ascii() => {
                let time = parse_hhmm(&format!("{}:{}", &hhmm[..2], &hhmm[2..])).ok()?;
                PanelAction::Time { group_id, slot: slot.parse().ok()?, time: format_hhmm(time) }
            }
            ("pn", []) => PanelAction::Refresh { group_id },
            ("cl", []) => PanelAction::Close { group_id },
            _ => return None,
        };
        Some(action)
    }

    /// Settings change carried by this action, if any
    pub fn mutation(&self) -> Option<Mutation> {
        match self {
            PanelAction::Toggle { field, .. } => Some(Mutation::Toggle(*field)),
            PanelAction::Media { media, .. } => Some(Mutation::SetMediaType(*media)),
            PanelAction::Interval { minutes, .. } => Some(Mutation::SetInterval(*minutes)),
            PanelAction::Time { slot, time, .. } => Some(Mutation::SetTime(*slot, time.clone())),
            PanelAction::Refresh { .. } | PanelAction::Close { .. } => None,
        }
    }
}

/// Main callback query dispatcher.
///
/// The query is always answered; failures answer with an alert.
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, ctx: Arc<AppContext>) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let data = query.data.clone().unwrap_or_default();
    debug!(user_id = user_id, callback_data = %data, "Processing callback query");

    let Some(action) = PanelAction::parse(&data) else {
        warn!(user_id = user_id, callback_data = %data, "Unknown callback data");
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    match apply_action(&bot, &query, &ctx, user_id, &action).await {
        Ok(notice) => {
            bot.answer_callback_query(query.id.clone()).text(notice).await?;
        }
        Err(e) => {
            warn!(
                user_id = user_id,
                chat_id = action.group_id(),
                severity = %e.severity(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Panel action failed"
            );
            bot.answer_callback_query(query.id.clone())
                .text(e.user_message(&ctx.i18n))
                .show_alert(true)
                .await?;
        }
    }

    Ok(())
}

async fn apply_action(
    bot: &Bot,
    query: &CallbackQuery,
    ctx: &AppContext,
    user_id: i64,
    action: &PanelAction,
) -> Result<String> {
    let group_id = action.group_id();
    let message = query.message.as_ref().map(|m| (m.chat().id, m.id()));

    let settings = match action {
        PanelAction::Close { .. } => {
            ctx.control.panel(group_id, user_id).await?;
            if let Some((chat, id)) = message {
                bot.delete_message(chat, id).await?;
            }
            info!(chat_id = group_id, user_id = user_id, "Control panel closed");
            return Ok(ctx.t("panel.closed"));
        }
        PanelAction::Refresh { .. } => ctx.control.panel(group_id, user_id).await?,
        other => match other.mutation() {
            Some(mutation) => ctx.control.apply(group_id, user_id, mutation).await?,
            None => ctx.control.panel(group_id, user_id).await?,
        },
    };

    if let Some((chat, id)) = message {
        refresh_panel(bot, ctx, chat, id, &settings).await;
    }
    Ok(ctx.t("panel.saved"))
}

/// Re-render the panel message in place
async fn refresh_panel(bot: &Bot, ctx: &AppContext, chat: ChatId, id: teloxide::types::MessageId, settings: &GroupSettings) {
    let deep_link = (!chat.is_user()).then_some(ctx.bot_username.as_str());
    let keyboard = panel::keyboard(&ctx.i18n, settings, deep_link);
    let text = panel::panel_text(&ctx.i18n, settings);

    if let Err(e) = bot.edit_message_text(chat, id, text).reply_markup(keyboard).await {
        // Telegram rejects edits that change nothing
        debug!(chat_id = chat.0, error = %e, "Panel message not edited");
    }
}
