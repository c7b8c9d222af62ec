//! Media downloading: the fetcher seam, the yt-dlp implementation, the
//! aspect-ratio fix, and the per-request pipeline.

pub mod aspect;
pub mod error;
pub mod pipeline;
pub mod ytdlp;

use std::path::PathBuf;

use async_trait::async_trait;
use teloxide::types::ChatId;

use crate::core::validation::Platform;
use error::DownloadError;

/// A downloaded artifact on the local filesystem.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub path: PathBuf,
    /// Size in bytes, as measured after the download finished.
    pub size: u64,
}

/// Narrow capability interface over the external download call.
///
/// The pipeline only talks to this trait, so tests drive the whole admission
/// flow with a double instead of a real yt-dlp subprocess.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Downloads the video behind `url` and returns the local file.
    ///
    /// Long-running; the caller holds an admission permit for the duration.
    /// On failure no artifact is left behind.
    async fn fetch(&self, url: &str, platform: Platform, chat_id: ChatId) -> Result<FetchedMedia, DownloadError>;
}

pub use pipeline::DownloadService;
pub use ytdlp::YtDlpFetcher;
