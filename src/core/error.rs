use std::time::Duration;

use thiserror::Error;

use crate::download::error::DownloadError;

/// Centralized error type for a single download request.
///
/// None of these variants are process-fatal: a failed request is reported to
/// the user and the bot keeps serving everyone else. Startup problems are
/// handled with `anyhow` in `main` instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// User exceeded the per-window request quota.
    #[error("rate limited, retry in {retry_after:?}")]
    RateLimited {
        /// Time until the oldest counted request leaves the window.
        retry_after: Duration,
    },

    /// The bounded admission wait expired before a download slot freed up.
    #[error("all download slots busy")]
    Overloaded,

    /// yt-dlp / ffmpeg failure.
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Artifact exceeds the configured upload limit.
    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    /// Telegram API errors.
    #[error("telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors (artifact cleanup, size probing).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Message shown to the user in the chat.
    ///
    /// Internal detail stays in the logs; the chat gets a short actionable
    /// line in the bot's language.
    pub fn user_message(&self) -> String {
        match self {
            AppError::RateLimited { retry_after } => {
                format!("Подожди {} сек.", retry_after.as_secs().max(1))
            }
            AppError::Overloaded => "Слишком много загрузок сейчас, попробуй через минуту.".to_string(),
            AppError::FileTooLarge { .. } | AppError::Download(DownloadError::Oversize) => {
                "Видео больше лимита Telegram (50 МБ)".to_string()
            }
            AppError::Download(_) | AppError::Telegram(_) | AppError::Io(_) => {
                "Не удалось скачать видео. Попробуй другую ссылку позже.".to_string()
            }
        }
    }
}
