//! Group administration commands

use teloxide::payloads::setters::*;
use teloxide::prelude::*;

use crate::handlers::panel;
use crate::i18n::params;
use crate::models::TimeSlot;
use crate::services::{AppContext, Mutation};
use crate::utils::errors::Result;

/// Group the command applies to; replies and yields `None` outside groups
async fn group_of(bot: &Bot, msg: &Message, ctx: &AppContext) -> Result<Option<i64>> {
    if msg.chat.is_private() {
        bot.send_message(msg.chat.id, ctx.t("commands.group_only")).await?;
        return Ok(None);
    }
    Ok(Some(msg.chat.id.0))
}

/// Handle /enable and /disable
pub async fn handle_enable(bot: &Bot, msg: &Message, ctx: &AppContext, user_id: i64, enable: bool) -> Result<()> {
    let Some(group_id) = group_of(bot, msg, ctx).await? else {
        return Ok(());
    };

    let mutation = if enable { Mutation::Enable } else { Mutation::Disable };
    let settings = ctx.control.apply(group_id, user_id, mutation).await?;

    let key = if enable { "commands.enabled" } else { "commands.disabled" };
    let text = format!("{}\n\n{}", ctx.t(key), panel::status_text(&ctx.i18n, &settings));
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /status
pub async fn handle_status(bot: &Bot, msg: &Message, ctx: &AppContext) -> Result<()> {
    let Some(group_id) = group_of(bot, msg, ctx).await? else {
        return Ok(());
    };

    let settings = ctx.control.status(group_id).await?;
    bot.send_message(msg.chat.id, panel::status_text(&ctx.i18n, &settings)).await?;
    Ok(())
}

/// Handle /settings
pub async fn handle_settings(bot: &Bot, msg: &Message, ctx: &AppContext, user_id: i64) -> Result<()> {
    let Some(group_id) = group_of(bot, msg, ctx).await? else {
        return Ok(());
    };

    let settings = ctx.control.panel(group_id, user_id).await?;
    let text = format!("{}\n\n{}", panel::panel_text(&ctx.i18n, &settings), ctx.t("commands.open_private"));
    bot.send_message(msg.chat.id, text)
        .reply_markup(panel::keyboard(&ctx.i18n, &settings, Some(&ctx.bot_username)))
        .await?;
    Ok(())
}

/// Split `/settime` arguments into slot and time
pub fn parse_set_time_args(args: &str) -> Option<(&str, &str)> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(slot), Some(time), None) => Some((slot, time)),
        _ => None,
    }
}

/// Handle /settime <morning|evening|sleep> HH:MM
pub async fn handle_set_time(bot: &Bot, msg: &Message, ctx: &AppContext, user_id: i64, args: &str) -> Result<()> {
    let Some(group_id) = group_of(bot, msg, ctx).await? else {
        return Ok(());
    };

    let Some((slot, time)) = parse_set_time_args(args) else {
        bot.send_message(msg.chat.id, ctx.t("commands.settime_usage")).await?;
        return Ok(());
    };
    let slot: TimeSlot = slot.parse()?;

    let settings = ctx
        .control
        .apply(group_id, user_id, Mutation::SetTime(slot, time.to_string()))
        .await?;

    let confirmation = ctx.i18n.t(
        "commands.time_set",
        Some(&params([
            ("slot", ctx.t(&format!("slots.{}", slot.as_str()))),
            ("time", settings.time_of(slot).to_string()),
        ])),
    );
    bot.send_message(msg.chat.id, format!("{}\n\n{}", confirmation, panel::status_text(&ctx.i18n, &settings)))
        .await?;
    Ok(())
}

/// Handle /setinterval <minutes>
pub async fn handle_set_interval(bot: &Bot, msg: &Message, ctx: &AppContext, user_id: i64, args: &str) -> Result<()> {
    let Some(group_id) = group_of(bot, msg, ctx).await? else {
        return Ok(());
    };

    let Ok(minutes) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, ctx.t("commands.setinterval_usage")).await?;
        return Ok(());
    };

    let settings = ctx.control.apply(group_id, user_id, Mutation::SetInterval(minutes)).await?;

    let confirmation = ctx.i18n.t(
        "commands.interval_set",
        Some(&params([("minutes", settings.diverse_interval_minutes.to_string())])),
    );
    bot.send_message(msg.chat.id, format!("{}\n\n{}", confirmation, panel::status_text(&ctx.i18n, &settings)))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_time_arguments() {
        assert_eq!(parse_set_time_args("morning 06:00"), Some(("morning", "06:00")));
        assert_eq!(parse_set_time_args("  sleep   22:30 "), Some(("sleep", "22:30")));
        assert_eq!(parse_set_time_args("morning"), None);
        assert_eq!(parse_set_time_args("morning 06:00 extra"), None);
        assert_eq!(parse_set_time_args(""), None);
    }
}
