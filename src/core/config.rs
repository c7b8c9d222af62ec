//! Startup configuration.
//!
//! All tunables are read from the environment exactly once, at startup, into
//! an owned [`Config`] that is passed down through handler dependencies.
//! A missing bot token or a non-numeric value in a numeric variable is fatal:
//! the process refuses to start rather than run with a half-read config.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Hosts recognized as X (Twitter) links.
pub const X_HOSTS: &[&str] = &["twitter.com", "www.twitter.com", "x.com", "www.x.com", "t.co"];

/// Hosts recognized as Instagram links.
pub const INSTAGRAM_HOSTS: &[&str] = &["instagram.com", "www.instagram.com", "m.instagram.com"];

/// Process-wide configuration, read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: String,
    /// Telegram user id allowed to run `/stats`. 0 disables the command.
    pub owner_id: u64,
    /// Directory for downloaded artifacts (tilde-expanded).
    pub download_dir: PathBuf,
    /// Maximum file size accepted for upload, in bytes.
    pub max_file_size: u64,
    /// Admission-gate pool size: maximum simultaneous yt-dlp runs.
    pub max_parallel_downloads: usize,
    /// Maximum requests per user inside one sliding window.
    pub rate_limit_requests: usize,
    /// Sliding-window length.
    pub rate_limit_window: Duration,
    /// Optional bounded wait for an admission slot. `None` waits indefinitely.
    pub admission_wait: Option<Duration>,
    /// Cookie file passed to yt-dlp for Instagram URLs, when it exists.
    pub instagram_cookies: PathBuf,
    /// Whether to normalize non-square sample aspect ratios on X videos.
    pub normalize_x_aspect: bool,
    /// Timeout for ffmpeg/ffprobe subprocesses.
    pub ffmpeg_timeout: Duration,
    /// Timeout for yt-dlp subprocesses.
    pub ytdlp_timeout: Duration,
    /// yt-dlp binary path or name.
    pub ytdl_bin: String,
    /// ffmpeg binary path or name.
    pub ffmpeg_bin: String,
    /// ffprobe binary path or name.
    pub ffprobe_bin: String,
    /// Log file path.
    pub log_file: String,
}

/// Reads an integer variable, falling back to `default` when unset.
///
/// An unparsable value is an error, not a silent fallback: a typo in
/// `MAX_FILE_SIZE` must not quietly become the default limit.
fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{name} must be an integer, got {value:?}")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow!("{name}: {e}")),
    }
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Builds the configuration from the environment.
    ///
    /// Creates the download directory if it does not exist. Returns an error
    /// (fatal at the call site in `main`) when the token is missing, a
    /// numeric variable is malformed, or the directory cannot be created.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN").map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;
        if bot_token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN is empty"));
        }

        let download_dir = PathBuf::from(shellexpand::tilde(&env_string("DOWNLOAD_DIR", "downloads")).to_string());
        std::fs::create_dir_all(&download_dir)
            .with_context(|| format!("failed to create download dir {}", download_dir.display()))?;

        let max_parallel = env_u64("MAX_PARALLEL_DOWNLOADS", 3)?;
        if max_parallel == 0 {
            return Err(anyhow!("MAX_PARALLEL_DOWNLOADS must be at least 1"));
        }
        let rate_limit_requests = env_u64("RATE_LIMIT_REQUESTS", 5)?;
        if rate_limit_requests == 0 {
            return Err(anyhow!("RATE_LIMIT_REQUESTS must be at least 1"));
        }

        let admission_wait = match env::var("ADMISSION_WAIT_SECS") {
            Ok(value) => Some(Duration::from_secs(
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("ADMISSION_WAIT_SECS must be an integer, got {value:?}"))?,
            )),
            Err(_) => None,
        };

        Ok(Self {
            bot_token,
            owner_id: env_u64("OWNER_ID", 0)?,
            download_dir,
            max_file_size: env_u64("MAX_FILE_SIZE", 50 * 1024 * 1024)?,
            max_parallel_downloads: max_parallel as usize,
            rate_limit_requests: rate_limit_requests as usize,
            rate_limit_window: Duration::from_secs(env_u64("RATE_LIMIT_WINDOW", 60)?),
            admission_wait,
            instagram_cookies: PathBuf::from(env_string("INSTAGRAM_COOKIES", "/app/cookies/instagram.txt")),
            normalize_x_aspect: env_string("NORMALIZE_X_ASPECT", "1") == "1",
            ffmpeg_timeout: Duration::from_secs(env_u64("FFMPEG_TIMEOUT_SECONDS", 180)?),
            ytdlp_timeout: Duration::from_secs(env_u64("YTDLP_TIMEOUT_SECONDS", 120)?),
            ytdl_bin: env_string("YTDL_BIN", "yt-dlp"),
            ffmpeg_bin: env_string("FFMPEG_BIN", "ffmpeg"),
            ffprobe_bin: env_string("FFPROBE_BIN", "ffprobe"),
            log_file: env_string("LOG_FILE", "reelsnap.log"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_u64_parses_value() {
        std::env::set_var("REELSNAP_TEST_INT", "42");
        assert_eq!(env_u64("REELSNAP_TEST_INT", 7).unwrap(), 42);
        std::env::remove_var("REELSNAP_TEST_INT");
    }

    #[test]
    fn env_u64_uses_default_when_unset() {
        std::env::remove_var("REELSNAP_TEST_MISSING");
        assert_eq!(env_u64("REELSNAP_TEST_MISSING", 7).unwrap(), 7);
    }

    #[test]
    fn env_u64_rejects_garbage() {
        std::env::set_var("REELSNAP_TEST_BAD", "not-a-number");
        assert!(env_u64("REELSNAP_TEST_BAD", 7).is_err());
        std::env::remove_var("REELSNAP_TEST_BAD");
    }
}
