//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for the inline control panel
//! - Membership handlers for the bot's own status in groups

pub mod callbacks;
pub mod commands;
pub mod dispatch;
pub mod members;
pub mod panel;

// Re-export commonly used handler functions
pub use callbacks::{handle_callback_query, PanelAction};
pub use commands::{handle_command, Command};
pub use dispatch::{create_handler, HandlerError, HandlerResult};
pub use members::handle_my_chat_member;
