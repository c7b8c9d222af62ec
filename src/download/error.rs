use thiserror::Error;

/// Structured error type for download operations.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp failures (binary not found, bad exit code, unsupported URL).
    #[error("{0}")]
    YtDlp(String),
    /// FFmpeg/ffprobe processing failures.
    #[error("{0}")]
    Ffmpeg(String),
    /// Expected file not found after the download reported success.
    #[error("{0}")]
    FileNotFound(String),
    /// Download or processing timed out.
    #[error("{0}")]
    Timeout(String),
    /// Every format attempt produced a file over the size limit.
    #[error("all format attempts exceeded the size limit")]
    Oversize,
    /// Process spawn/execution failure.
    #[error("{0}")]
    Process(String),
}

impl DownloadError {
    /// Short label for log lines.
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::YtDlp(_) => "ytdlp",
            DownloadError::Ffmpeg(_) => "ffmpeg",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Oversize => "oversize",
            DownloadError::Process(_) => "process",
        }
    }
}
