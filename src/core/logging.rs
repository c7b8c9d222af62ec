//! Logger initialization (console + file).

use std::fs::File;

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

/// Initialize the logger for both console and file output.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file =
        File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
