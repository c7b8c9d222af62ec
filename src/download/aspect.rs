//! Sample-aspect-ratio normalization for X videos.
//!
//! Some X encodes carry a non-square sample aspect ratio that Telegram
//! clients render stretched. When enabled, such files are re-encoded with
//! `setsar=1` through a quality ladder until one fits under the size limit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::config::Config;
use crate::core::validation::Platform;
use crate::download::error::DownloadError;

/// Re-encode profiles tried in order: source resolution first, then smaller.
const PROFILES: &[(&str, &str, &str)] = &[
    ("setsar=1,scale=trunc(iw/2)*2:trunc(ih/2)*2", "23", "norm"),
    ("setsar=1,scale=-2:720", "28", "norm720"),
    ("setsar=1,scale=-2:540", "30", "norm540"),
];

async fn tool_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Both ffmpeg and ffprobe must be runnable for the fix to be attempted.
async fn ffmpeg_tools_available(config: &Config) -> bool {
    tool_available(&config.ffprobe_bin).await && tool_available(&config.ffmpeg_bin).await
}

/// Reads the first video stream's sample aspect ratio with ffprobe.
async fn probe_sample_aspect_ratio(config: &Config, path: &Path) -> Result<Option<String>, DownloadError> {
    let mut cmd = Command::new(&config.ffprobe_bin);
    cmd.args(["-v", "error"])
        .args(["-select_streams", "v:0"])
        .args(["-show_entries", "stream=sample_aspect_ratio"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = timeout(config.ffmpeg_timeout, cmd.output())
        .await
        .map_err(|_| DownloadError::Timeout("ffprobe timed out".to_string()))?
        .map_err(|e| DownloadError::Process(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(DownloadError::Ffmpeg(format!(
            "ffprobe exited with {:?}",
            output.status.code()
        )));
    }

    let sar = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if sar.is_empty() { None } else { Some(sar) })
}

/// Whether `path` needs the SAR fix before upload.
///
/// Only X videos are affected; missing tools or any probe failure skip the
/// fix rather than failing the request, since a stretched video is better
/// than no video.
pub async fn needs_aspect_fix(config: &Config, path: &Path, platform: Platform) -> bool {
    if platform != Platform::X || !config.normalize_x_aspect {
        return false;
    }
    if !ffmpeg_tools_available(config).await {
        log::warn!("ffmpeg/ffprobe not found, skip aspect fix");
        return false;
    }

    let sar = match probe_sample_aspect_ratio(config, path).await {
        Ok(sar) => sar,
        Err(e) => {
            log::warn!("Failed to probe SAR, skip aspect fix: {}", e);
            return false;
        }
    };

    match sar.as_deref() {
        None | Some("N/A") | Some("1:1") | Some("0:1") => false,
        Some(sar) => {
            log::info!("Detected non-square SAR={}, applying aspect fix", sar);
            true
        }
    }
}

async fn run_encode(config: &Config, input: &Path, output: &Path, vf: &str, crf: &str) -> bool {
    let mut cmd = Command::new(&config.ffmpeg_bin);
    cmd.arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-vf", vf])
        .args(["-c:v", "libx264"])
        .args(["-preset", "veryfast"])
        .args(["-crf", crf])
        .args(["-c:a", "aac"])
        .args(["-movflags", "+faststart"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    match timeout(config.ffmpeg_timeout, cmd.output()).await {
        Ok(Ok(out)) if out.status.success() => true,
        Ok(Ok(out)) => {
            log::info!("ffmpeg encode failed for crf={} vf={} (exit {:?})", crf, vf, out.status.code());
            false
        }
        Ok(Err(e)) => {
            log::info!("ffmpeg spawn failed: {}", e);
            false
        }
        Err(_) => {
            log::info!("ffmpeg encode timed out for crf={} vf={}", crf, vf);
            false
        }
    }
}

/// Re-encodes `input` with a square SAR, returning the first profile output
/// that fits under the size limit. The input file is left in place; the
/// caller decides what to delete.
///
/// An all-profiles-oversized outcome is reported as `Oversize`; a ladder
/// where no encode ran at all is an `Ffmpeg` failure, so a broken ffmpeg
/// install is never mistaken for a too-large video.
pub async fn fix_aspect_ratio(config: &Config, input: &Path, stem: &str) -> Result<PathBuf, DownloadError> {
    let mut encode_succeeded = false;

    for (vf, crf, suffix) in PROFILES {
        let output = config.download_dir.join(format!("{stem}_{suffix}.mp4"));
        if !run_encode(config, input, &output, vf, crf).await {
            continue;
        }
        encode_succeeded = true;

        match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.len() <= config.max_file_size => return Ok(output),
            Ok(_) | Err(_) => {
                let _ = tokio::fs::remove_file(&output).await;
            }
        }
    }

    if encode_succeeded {
        Err(DownloadError::Oversize)
    } else {
        Err(DownloadError::Ffmpeg("all aspect-fix encode attempts failed".to_string()))
    }
}
