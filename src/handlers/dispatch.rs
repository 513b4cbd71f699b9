//! Update routing tree
//!
//! Shared by the polling dispatcher and the webhook server.

use std::sync::Arc;

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatMemberUpdated};
use tracing::error;

use crate::services::AppContext;

use super::callbacks::handle_callback_query;
use super::commands::{handle_command, Command};
use super::members::handle_my_chat_member;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

/// Create the main update handler
pub fn create_handler() -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_commands),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
        .branch(Update::filter_my_chat_member().endpoint(handle_membership))
}

/// Handle bot commands
async fn handle_commands(bot: Bot, msg: Message, cmd: Command, ctx: Arc<AppContext>) -> HandlerResult {
    let chat_id = msg.chat.id.0;
    if let Err(e) = handle_command(bot, msg, cmd, ctx).await {
        error!(chat_id = chat_id, error = %e, "Error handling command");
        return Err(e.into());
    }
    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(bot: Bot, query: CallbackQuery, ctx: Arc<AppContext>) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    if let Err(e) = handle_callback_query(bot, query, ctx).await {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }
    Ok(())
}

/// Handle chat member updates (bot added/removed from groups)
async fn handle_membership(bot: Bot, update: ChatMemberUpdated, ctx: Arc<AppContext>) -> HandlerResult {
    let chat_id = update.chat.id.0;
    if let Err(e) = handle_my_chat_member(bot, update, ctx).await {
        error!(chat_id = chat_id, error = %e, "Error handling membership change");
        return Err(e.into());
    }
    Ok(())
}
