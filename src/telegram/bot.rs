//! Bot initialization and the command enum.

use std::time::Duration;

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::Config;

/// HTTP client timeout for Telegram API requests.
/// Generous because video uploads ride the same client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(900);

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "что умеет бот")]
    Start,
    #[command(description = "статистика (только для владельца)")]
    Stats,
}

/// Creates a Bot instance with a long-timeout HTTP client.
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Bot::with_client(config.bot_token.clone(), client))
}

/// Sets up bot commands in the Telegram UI.
///
/// `/stats` is owner-only and deliberately left out of the visible command
/// list; it still parses for everyone but answers only the owner.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![BotCommand::new("start", "что умеет бот")]).await?;

    Ok(())
}
