//! Test doubles for the download pipeline seams.

#![allow(dead_code)] // Each integration test binary uses a subset.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;
use tokio::time::Duration;

use reelsnap::core::error::AppResult;
use reelsnap::core::validation::Platform;
use reelsnap::download::error::DownloadError;
use reelsnap::download::{FetchedMedia, MediaFetcher};
use reelsnap::telegram::Notifier;

/// Fake fetcher with configurable delay, failure mode, and reported size.
/// Tracks in-flight concurrency so tests can assert the admission cap.
pub struct FakeFetcher {
    pub dir: PathBuf,
    pub delay: Duration,
    pub fail: bool,
    /// Size reported in `FetchedMedia`, independent of the bytes written.
    pub reported_size: u64,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            delay: Duration::ZERO,
            fail: false,
            reported_size: 1024,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_reported_size(mut self, size: u64) -> Self {
        self.reported_size = size;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_observed_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str, _platform: Platform, chat_id: ChatId) -> Result<FetchedMedia, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(DownloadError::YtDlp("simulated failure".to_string()));
        }

        let path = self.dir.join(format!("video_{}_{}.mp4", chat_id.0, self.calls()));
        tokio::fs::write(&path, b"fake video bytes")
            .await
            .map_err(|e| DownloadError::Process(e.to_string()))?;
        Ok(FetchedMedia {
            path,
            size: self.reported_size,
        })
    }
}

/// Everything the pipeline told the user, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    Status(String),
    Edit(String),
    Video(PathBuf),
}

/// Recording [`Notifier`] double.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn events(&self) -> Vec<Sent> {
        self.events.lock().await.clone()
    }

    pub async fn videos_sent(&self) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| matches!(e, Sent::Video(_)))
            .count()
    }

    pub async fn last_edit(&self) -> Option<String> {
        self.events.lock().await.iter().rev().find_map(|e| match e {
            Sent::Edit(text) => Some(text.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, _chat_id: ChatId, text: &str) -> AppResult<()> {
        self.events.lock().await.push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_status(&self, _chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        self.events.lock().await.push(Sent::Status(text.to_string()));
        Ok(MessageId(1))
    }

    async fn edit_status(&self, _chat_id: ChatId, _message: MessageId, text: &str) {
        self.events.lock().await.push(Sent::Edit(text.to_string()));
    }

    async fn send_video(&self, _chat_id: ChatId, path: &Path) -> AppResult<()> {
        self.events.lock().await.push(Sent::Video(path.to_path_buf()));
        Ok(())
    }
}
