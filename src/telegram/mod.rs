//! Telegram surface: bot construction, the notifier seam, handlers.

pub mod bot;
pub mod handlers;
pub mod notifier;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps};
pub use notifier::{Notifier, TelegramNotifier};
