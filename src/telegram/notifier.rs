//! Narrow capability interface over the Telegram send/edit surface.
//!
//! The download pipeline only talks to [`Notifier`], so its tests run
//! against an in-memory double instead of the Bot API.

use std::path::Path;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId};

use crate::core::error::AppResult;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a standalone text reply.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<()>;

    /// Sends the status message whose id later edits refer to.
    async fn send_status(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId>;

    /// Edits the status message. Best effort: a failed edit is logged, not
    /// propagated, since the download outcome does not depend on it.
    async fn edit_status(&self, chat_id: ChatId, message: MessageId, text: &str);

    /// Uploads the video file as a reply.
    async fn send_video(&self, chat_id: ChatId, path: &Path) -> AppResult<()>;
}

/// Production [`Notifier`] backed by teloxide.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_status(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        let message = self.bot.send_message(chat_id, text).await?;
        Ok(message.id)
    }

    async fn edit_status(&self, chat_id: ChatId, message: MessageId, text: &str) {
        if let Err(e) = self.bot.edit_message_text(chat_id, message, text).await {
            log::warn!("Failed to edit status message: {}", e);
        }
    }

    async fn send_video(&self, chat_id: ChatId, path: &Path) -> AppResult<()> {
        self.bot
            .send_video(chat_id, InputFile::file(path.to_path_buf()))
            .supports_streaming(true)
            .await?;
        Ok(())
    }
}
