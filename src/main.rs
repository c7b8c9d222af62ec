use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::time::interval;

use reelsnap::core::{config::Config, init_logger};
use reelsnap::download::{DownloadService, YtDlpFetcher};
use reelsnap::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present, before config is read.
    let _ = dotenv();

    let config = Arc::new(Config::from_env()?);
    init_logger(&config.log_file)?;

    log::info!(
        "Bot started (max_parallel={}, rate_limit={}/{:?}, max_file_size={} bytes)",
        config.max_parallel_downloads,
        config.rate_limit_requests,
        config.rate_limit_window,
        config.max_file_size
    );

    let fetcher = Arc::new(YtDlpFetcher::new(Arc::clone(&config)));
    let service = Arc::new(DownloadService::new(Arc::clone(&config), fetcher));

    // Chats that never return would otherwise accumulate in the rate-limit
    // store; sweep once per window.
    let sweep_limiter = service.rate_limiter.clone();
    let sweep_period = config.rate_limit_window;
    tokio::spawn(async move {
        let mut ticker = interval(sweep_period);
        loop {
            ticker.tick().await;
            sweep_limiter.sweep_stale();
        }
    });

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps { config, service };

    Dispatcher::builder(bot, schema(deps))
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown");
    Ok(())
}
