//! Dispatcher schema and handler chain builders.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use crate::core::config::Config;
use crate::core::validation::parse_platform;
use crate::download::DownloadService;
use crate::telegram::bot::Command;
use crate::telegram::notifier::TelegramNotifier;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub config: Arc<Config>,
    pub service: Arc<DownloadService>,
}

/// Creates the main dispatcher schema for the bot.
///
/// The same tree is used in production and by integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);
                match cmd {
                    Command::Start => handle_start(&bot, &msg).await?,
                    Command::Stats => handle_stats(&bot, &msg, &deps).await?,
                }
                Ok(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            let Some(text) = msg.text() else { return Ok(()) };
            // Non-URL chatter and unknown hosts are ignored, not answered.
            let Some(platform) = parse_platform(text.trim()) else {
                return Ok(());
            };

            let notifier = TelegramNotifier::new(bot);
            deps.service
                .process_request(&notifier, msg.chat.id, text.trim(), platform)
                .await?;
            Ok(())
        }
    })
}

async fn handle_start(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(
        msg.chat.id,
        "Пришли ссылку на X (Twitter) или Instagram Reel, пришлю видео.\n\
         Видео больше 50 МБ не поддерживаются.",
    )
    .await?;
    Ok(())
}

async fn handle_stats(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    // Owner-only; everyone else gets silence, like an unknown command.
    let from_owner = deps.config.owner_id != 0
        && msg.from.as_ref().map(|u| u.id.0) == Some(deps.config.owner_id);
    if !from_owner {
        return Ok(());
    }

    bot.send_message(msg.chat.id, deps.service.stats.report()).await?;
    Ok(())
}
