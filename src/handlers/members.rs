//! Bot membership changes
//!
//! `my_chat_member` updates report the bot's own status in a chat. Losing
//! the chat disables the group; every other transition refreshes the admin
//! cache.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ChatMemberUpdated};
use tracing::{debug, error, warn};

use crate::services::AppContext;
use crate::utils::errors::Result;
use crate::utils::logging::log_group_event;

/// How the bot's membership changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// The bot joined the chat
    Added,
    /// The bot was removed or banned
    Removed,
    /// Still present with different rights
    Updated,
}

fn is_gone(kind: &ChatMemberKind) -> bool {
    matches!(kind, ChatMemberKind::Left | ChatMemberKind::Banned(_))
}

/// Classify a transition from whether the bot was and is in the chat
pub fn classify(was_present: bool, is_present: bool) -> MembershipChange {
    match (was_present, is_present) {
        (_, false) => MembershipChange::Removed,
        (false, true) => MembershipChange::Added,
        (true, true) => MembershipChange::Updated,
    }
}

/// Handle a change of the bot's own membership
pub async fn handle_my_chat_member(bot: Bot, update: ChatMemberUpdated, ctx: Arc<AppContext>) -> Result<()> {
    if update.chat.is_private() {
        return Ok(());
    }

    let chat_id = update.chat.id.0;
    let change = classify(
        !is_gone(&update.old_chat_member.kind),
        !is_gone(&update.new_chat_member.kind),
    );
    debug!(chat_id = chat_id, change = ?change, "Bot membership changed");

    apply_membership_change(&ctx, chat_id, change).await?;

    if change == MembershipChange::Added {
        if let Err(e) = bot.send_message(update.chat.id, ctx.t("members.added")).await {
            warn!(chat_id = chat_id, error = %e, "Could not send welcome message");
        }
    }

    Ok(())
}

/// Bring stored state in line with a membership change.
///
/// Removal disables the group and drops its jobs; any other change
/// re-syncs the admin cache, and joining also creates the default row.
pub async fn apply_membership_change(ctx: &AppContext, chat_id: i64, change: MembershipChange) -> Result<()> {
    if change == MembershipChange::Removed {
        ctx.store.set_enabled(chat_id, false).await?;
        if let Err(e) = ctx.scheduler.reschedule().await {
            error!(chat_id = chat_id, error = %e, "Reschedule after removal failed");
        }
        log_group_event(chat_id, "bot_removed", None);
        return Ok(());
    }

    if let Err(e) = ctx.control.auth().resync(chat_id).await {
        warn!(chat_id = chat_id, error = %e, "Admin re-sync failed");
    }

    if change == MembershipChange::Added {
        ctx.store.get_group(chat_id).await?;
        log_group_event(chat_id, "bot_added", None);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_transitions() {
        assert_eq!(classify(false, false), MembershipChange::Removed);
        assert_eq!(classify(true, false), MembershipChange::Removed);
        assert_eq!(classify(false, true), MembershipChange::Added);
        assert_eq!(classify(true, true), MembershipChange::Updated);
        assert!(is_gone(&ChatMemberKind::Left));
    }
}
