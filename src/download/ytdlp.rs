//! yt-dlp invocation with a degrading format ladder.
//!
//! Each request gets up to four attempts: first a size-capped `best`
//! selector, then progressively lower resolution caps. An attempt that
//! produces an oversized file is deleted and the next rung is tried; if every
//! rung either fails or comes out oversized, the request fails with the
//! matching error.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::ChatId;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

use crate::core::config::Config;
use crate::core::validation::Platform;
use crate::download::error::DownloadError;
use crate::download::{FetchedMedia, MediaFetcher};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

pub struct YtDlpFetcher {
    config: Arc<Config>,
}

impl YtDlpFetcher {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Format selectors tried in order, best first.
    fn format_ladder(&self) -> Vec<String> {
        let max = self.config.max_file_size;
        vec![
            format!(
                "best[ext=mp4][filesize<={max}]\
                 /best[ext=mp4][filesize_approx<={max}]\
                 /best[filesize<={max}]\
                 /best[filesize_approx<={max}]\
                 /best[ext=mp4]"
            ),
            "best[height<=1080][ext=mp4]/best[height<=1080]".to_string(),
            "best[height<=720][ext=mp4]/best[height<=720]".to_string(),
            "best[height<=540][ext=mp4]/best[height<=540]".to_string(),
        ]
    }

    fn build_command(&self, url: &str, outtmpl: &str, selector: &str, platform: Platform) -> Command {
        let mut cmd = Command::new(&self.config.ytdl_bin);
        cmd.arg(url)
            .args(["-o", outtmpl])
            .args(["-f", selector])
            .args(["--merge-output-format", "mp4"])
            .arg("--no-playlist")
            .arg("--quiet")
            .args(["--user-agent", USER_AGENT])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if platform == Platform::Instagram && self.config.instagram_cookies.exists() {
            cmd.arg("--cookies").arg(&self.config.instagram_cookies);
        }

        cmd
    }

    /// Runs one yt-dlp attempt and returns the produced file.
    async fn run_attempt(
        &self,
        url: &str,
        stem: &str,
        selector: &str,
        platform: Platform,
    ) -> Result<PathBuf, DownloadError> {
        let outtmpl = self
            .config
            .download_dir
            .join(format!("{stem}.%(ext)s"))
            .to_string_lossy()
            .into_owned();
        let mut cmd = self.build_command(url, &outtmpl, selector, platform);

        let output = timeout(self.config.ytdlp_timeout, cmd.output())
            .await
            .map_err(|_| DownloadError::Timeout(format!("yt-dlp timed out after {:?}", self.config.ytdlp_timeout)))?
            .map_err(|e| DownloadError::Process(format!("failed to run {}: {}", self.config.ytdl_bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::YtDlp(format!(
                "yt-dlp exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        // The output template leaves the extension to yt-dlp, so locate the
        // produced file by its stem.
        find_by_stem(&self.config.download_dir, stem)
            .await?
            .ok_or_else(|| DownloadError::FileNotFound(format!("yt-dlp produced no file for {stem}")))
    }
}

/// Finds the unique file in `dir` whose name starts with `stem.`.
async fn find_by_stem(dir: &Path, stem: &str) -> Result<Option<PathBuf>, DownloadError> {
    let prefix = format!("{stem}.");
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::Process(format!("failed to read {}: {}", dir.display(), e)))?;
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                if entry.file_name().to_string_lossy().starts_with(&prefix) {
                    return Ok(Some(entry.path()));
                }
            }
            Ok(None) => return Ok(None),
            Err(e) => {
                return Err(DownloadError::Process(format!(
                    "failed to scan {}: {}",
                    dir.display(),
                    e
                )))
            }
        }
    }
}

async fn remove_if_exists(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, platform: Platform, chat_id: ChatId) -> Result<FetchedMedia, DownloadError> {
        let unique_id = Uuid::new_v4().simple().to_string();
        log::info!("[chat={}] download start platform={} url={}", chat_id, platform.as_str(), url);

        let mut last_error: Option<DownloadError> = None;
        let mut oversize_detected = false;

        for (attempt, selector) in self.format_ladder().iter().enumerate() {
            let stem = format!("video_{}_{}_a{}", chat_id.0, unique_id, attempt + 1);

            match self.run_attempt(url, &stem, selector, platform).await {
                Ok(path) => {
                    // An unreadable artifact is a failed attempt, not the end
                    // of the ladder.
                    let size = match tokio::fs::metadata(&path).await {
                        Ok(meta) => meta.len(),
                        Err(e) => {
                            remove_if_exists(&path).await;
                            last_error =
                                Some(DownloadError::FileNotFound(format!("{}: {}", path.display(), e)));
                            continue;
                        }
                    };
                    log::info!(
                        "[chat={}] attempt={} downloaded {:.1} MB",
                        chat_id,
                        attempt + 1,
                        size as f64 / 1024.0 / 1024.0
                    );

                    if size <= self.config.max_file_size {
                        return Ok(FetchedMedia { path, size });
                    }
                    oversize_detected = true;
                    remove_if_exists(&path).await;
                }
                Err(e) => {
                    log::info!("[chat={}] attempt={} failed ({})", chat_id, attempt + 1, e.subcategory());
                    // A timed-out or crashed attempt can leave a partial file.
                    if let Ok(Some(partial)) = find_by_stem(&self.config.download_dir, &stem).await {
                        remove_if_exists(&partial).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        if oversize_detected {
            return Err(DownloadError::Oversize);
        }
        Err(last_error.unwrap_or_else(|| DownloadError::YtDlp("no download attempts were made".to_string())))
    }
}
