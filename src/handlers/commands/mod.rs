//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /help, etc.

pub mod group;
pub mod start;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, warn};

use crate::services::AppContext;
use crate::utils::errors::{AdhkarError, Result};

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "أوامر بوت الأذكار:")]
pub enum Command {
    #[command(description = "بدء استخدام البوت")]
    Start(String),
    #[command(description = "عرض المساعدة")]
    Help,
    #[command(description = "تفعيل البوت في المجموعة (للمشرفين)")]
    Enable,
    #[command(description = "إيقاف البوت في المجموعة (للمشرفين)")]
    Disable,
    #[command(description = "عرض إعدادات المجموعة")]
    Status,
    #[command(description = "فتح لوحة التحكم (للمشرفين)")]
    Settings,
    #[command(description = "ضبط وقت الأذكار: morning|evening|sleep HH:MM")]
    SetTime(String),
    #[command(description = "ضبط فاصل المحتوى المتنوع بالدقائق")]
    SetInterval(String),
}

/// Main command dispatcher.
///
/// User-facing failures are answered in the chat; only transport errors
/// propagate.
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, ctx: Arc<AppContext>) -> Result<()> {
    let Some(user_id) = msg.from.as_ref().map(|user| user.id.0 as i64) else {
        debug!(chat_id = msg.chat.id.0, "Ignoring command without sender");
        return Ok(());
    };
    debug!(chat_id = msg.chat.id.0, user_id = user_id, command = ?cmd, "Processing command");

    let result = match cmd {
        Command::Start(payload) => start::handle_start(&bot, &msg, &ctx, user_id, payload.trim()).await,
        Command::Help => start::handle_help(&bot, &msg, &ctx, user_id).await,
        Command::Enable => group::handle_enable(&bot, &msg, &ctx, user_id, true).await,
        Command::Disable => group::handle_enable(&bot, &msg, &ctx, user_id, false).await,
        Command::Status => group::handle_status(&bot, &msg, &ctx).await,
        Command::Settings => group::handle_settings(&bot, &msg, &ctx, user_id).await,
        Command::SetTime(args) => group::handle_set_time(&bot, &msg, &ctx, user_id, &args).await,
        Command::SetInterval(args) => group::handle_set_interval(&bot, &msg, &ctx, user_id, &args).await,
    };

    match result {
        Err(AdhkarError::Telegram(e)) => Err(AdhkarError::Telegram(e)),
        Err(e) => {
            warn!(
                chat_id = msg.chat.id.0,
                user_id = user_id,
                severity = %e.severity(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Command failed"
            );
            bot.send_message(msg.chat.id, e.user_message(&ctx.i18n)).await?;
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}
