//! Start and help command handlers
//!
//! In a private chat `/start group_<base64>` opens the control panel of the
//! encoded group.

use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use tracing::{debug, info};

use crate::handlers::panel;
use crate::i18n::params;
use crate::services::{resolve_target, AppContext};
use crate::utils::errors::Result;

/// Handle /start
pub async fn handle_start(bot: &Bot, msg: &Message, ctx: &AppContext, user_id: i64, payload: &str) -> Result<()> {
    let chat = msg.chat.id;

    if msg.chat.is_private() {
        let payload = (!payload.is_empty()).then_some(payload);
        return match resolve_target(chat.0, true, payload) {
            Some(group_id) => {
                let settings = ctx.control.panel(group_id, user_id).await?;
                info!(chat_id = group_id, user_id = user_id, "Opened control panel in private chat");

                let text = format!(
                    "{}\n\n{}",
                    ctx.i18n.t("start.group_target", Some(&params([("group", group_id.to_string())]))),
                    panel::status_text(&ctx.i18n, &settings)
                );
                bot.send_message(chat, text)
                    .reply_markup(panel::keyboard(&ctx.i18n, &settings, None))
                    .await?;
                Ok(())
            }
            None => {
                if let Some(payload) = payload {
                    debug!(user_id = user_id, payload = payload, "Unrecognised start payload");
                }
                bot.send_message(chat, ctx.t("start.private")).await?;
                Ok(())
            }
        };
    }

    ctx.store.get_group(chat.0).await?;
    bot.send_message(chat, ctx.t("start.group")).await?;
    show_panel_to_admin(bot, ctx, chat, user_id).await
}

/// Handle /help
pub async fn handle_help(bot: &Bot, msg: &Message, ctx: &AppContext, user_id: i64) -> Result<()> {
    bot.send_message(msg.chat.id, ctx.t("help")).await?;

    if msg.chat.is_private() {
        return Ok(());
    }
    show_panel_to_admin(bot, ctx, msg.chat.id, user_id).await
}

async fn show_panel_to_admin(bot: &Bot, ctx: &AppContext, chat: ChatId, user_id: i64) -> Result<()> {
    if !ctx.control.auth().is_admin(chat.0, user_id).await? {
        return Ok(());
    }

    let settings = ctx.control.status(chat.0).await?;
    bot.send_message(chat, panel::panel_text(&ctx.i18n, &settings))
        .reply_markup(panel::keyboard(&ctx.i18n, &settings, Some(&ctx.bot_username)))
        .await?;
    Ok(())
}
