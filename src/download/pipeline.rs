//! Per-request download pipeline.
//!
//! Orchestrates one URL request end to end: rate-limit check, status
//! message, admission gate, fetch, size guard, aspect fix, upload, cleanup.
//! Talks to the outside world only through the [`MediaFetcher`] and
//! [`Notifier`] seams.

use std::path::PathBuf;
use std::sync::Arc;

use teloxide::types::ChatId;

use crate::core::admission::AdmissionGate;
use crate::core::config::Config;
use crate::core::error::{AppError, AppResult};
use crate::core::rate_limiter::RateLimiter;
use crate::core::stats::Stats;
use crate::core::validation::Platform;
use crate::download::{aspect, MediaFetcher};
use crate::telegram::notifier::Notifier;

/// Everything one request needs, owned by `main` and shared by handlers.
#[derive(Clone)]
pub struct DownloadService {
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
    pub gate: AdmissionGate,
    pub stats: Arc<Stats>,
    pub fetcher: Arc<dyn MediaFetcher>,
}

impl DownloadService {
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            rate_limiter: RateLimiter::new(config.rate_limit_requests, config.rate_limit_window),
            gate: AdmissionGate::new(config.max_parallel_downloads, config.admission_wait),
            stats: Arc::new(Stats::new()),
            config,
            fetcher,
        }
    }

    /// Handles one recognized URL from `chat_id`.
    ///
    /// All request-level failures are reported to the user here; the returned
    /// error only carries Telegram transport failures the caller may want to
    /// log.
    pub async fn process_request(
        &self,
        notifier: &dyn Notifier,
        chat_id: ChatId,
        url: &str,
        platform: Platform,
    ) -> AppResult<()> {
        // Rejected requests never reach the status-message stage.
        if let Err(e) = self.rate_limiter.check_and_record(chat_id) {
            log::info!("[chat={}] rate limited", chat_id);
            notifier.send_text(chat_id, &e.user_message()).await?;
            return Ok(());
        }

        let status = notifier.send_status(chat_id, "Загружаю...").await?;

        match self
            .download_and_send(notifier, chat_id, status, url, platform)
            .await
        {
            Ok(()) => {
                self.stats.record_success(chat_id, platform);
                log::info!("[chat={}] sent", chat_id);
            }
            Err(e) => {
                self.stats.record_error();
                match &e {
                    AppError::Telegram(_) | AppError::Io(_) => log::error!("[chat={}] {}", chat_id, e),
                    _ => log::info!("[chat={}] request failed: {}", chat_id, e),
                }
                notifier.edit_status(chat_id, status, &e.user_message()).await;
            }
        }
        Ok(())
    }

    /// Gate acquisition, fetch, size guard, aspect fix, upload.
    ///
    /// The artifact (and any re-encoded variant) is removed before returning,
    /// on every path.
    async fn download_and_send(
        &self,
        notifier: &dyn Notifier,
        chat_id: ChatId,
        status: teloxide::types::MessageId,
        url: &str,
        platform: Platform,
    ) -> AppResult<()> {
        // Permit is held across the fetch and released by drop, including
        // when fetch fails or this task is cancelled.
        let permit = self.gate.acquire().await?;
        log::debug!(
            "[chat={}] admission slot acquired ({} free)",
            chat_id,
            self.gate.available_permits()
        );

        let media = self.fetcher.fetch(url, platform, chat_id).await?;
        // The slot guards the download, not the upload.
        drop(permit);
        let mut path = media.path;

        let result = self
            .guard_and_send(notifier, chat_id, status, &mut path, media.size, platform)
            .await;
        remove_artifact(&path).await;
        result
    }

    async fn guard_and_send(
        &self,
        notifier: &dyn Notifier,
        chat_id: ChatId,
        status: teloxide::types::MessageId,
        path: &mut PathBuf,
        size: u64,
        platform: Platform,
    ) -> AppResult<()> {
        if size > self.config.max_file_size {
            return Err(AppError::FileTooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        if aspect::needs_aspect_fix(&self.config, path, platform).await {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "video".to_string());
            let normalized = aspect::fix_aspect_ratio(&self.config, path, &stem).await?;
            remove_artifact(path).await;
            *path = normalized;
        }

        notifier.edit_status(chat_id, status, "Отправляю...").await;
        notifier.send_video(chat_id, path).await?;
        Ok(())
    }
}

async fn remove_artifact(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove artifact {}: {}", path.display(), e);
        }
    }
}
