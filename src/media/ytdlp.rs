//! yt-dlp extraction and transcoding.
//!
//! Wraps the yt-dlp binary: metadata lookup via `--dump-json` and
//! downloads with a machine-readable progress template. Transcoding is
//! delegated to yt-dlp's own ffmpeg post-processing.

use super::{DownloadFormat, MediaInfo, MediaExtractor, ProgressFn};
use crate::config::DownloaderSettings;
use crate::error::{HentError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Marker prefix for progress lines so they can be told apart from other
/// yt-dlp output.
const PROGRESS_PREFIX: &str = "hent|";

/// Extraction/transcode collaborator backed by the yt-dlp binary.
pub struct YtDlpExtractor {
    audio_quality: String,
    max_video_height: u32,
    output_stem: String,
}

impl YtDlpExtractor {
    pub fn new(settings: &DownloaderSettings) -> Self {
        Self {
            audio_quality: settings.audio_quality.clone(),
            max_video_height: settings.max_video_height,
            output_stem: settings.output_stem.clone(),
        }
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        let output = Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", "--no-playlist", url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HentError::ToolNotFound("yt-dlp".to_string())
                } else {
                    HentError::Extraction(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HentError::Extraction(format!(
                "Could not fetch media info: {}",
                stderr.trim()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|e| HentError::Extraction(format!("Failed to parse yt-dlp output: {}", e)))?;

        Ok(MediaInfo {
            title: json["title"].as_str().unwrap_or("video").to_string(),
            thumbnail: json["thumbnail"].as_str().map(|s| s.to_string()),
            duration_seconds: json["duration"].as_f64().map(|d| d as u32),
        })
    }

    async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        work_dir: &Path,
        on_progress: ProgressFn,
    ) -> Result<()> {
        std::fs::create_dir_all(work_dir)?;

        let template = work_dir.join(format!("{}.%(ext)s", self.output_stem));

        let mut cmd = Command::new("yt-dlp");
        cmd.arg("--newline")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--progress-template")
            .arg(format!(
                "download:{}%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s",
                PROGRESS_PREFIX
            ))
            .arg("--output")
            .arg(&template);

        match format {
            DownloadFormat::Mp3 => {
                cmd.arg("--format")
                    .arg("bestaudio[ext=m4a]/bestaudio")
                    .arg("--extract-audio")
                    .arg("--audio-format")
                    .arg("mp3")
                    .arg("--audio-quality")
                    .arg(&self.audio_quality);
            }
            DownloadFormat::Mp4 => {
                cmd.arg("--format")
                    .arg(format!(
                        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                        h = self.max_video_height
                    ))
                    .arg("--merge-output-format")
                    .arg("mp4");
            }
        }

        cmd.arg(url).stdout(Stdio::piped()).stderr(Stdio::piped());

        info!("Downloading {} as {}", url, format);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HentError::ToolNotFound("yt-dlp".to_string())
            } else {
                HentError::Extraction(format!("Failed to start yt-dlp: {}", e))
            }
        })?;

        // Drain stderr concurrently so the pipe can't fill up and stall
        // the child; keep the tail for the error message.
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                let mut tail = Vec::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("yt-dlp: {}", line);
                    tail.push(line);
                    if tail.len() > 10 {
                        tail.remove(0);
                    }
                }
                tail.join("\n")
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(pct) = parse_progress_line(&line) {
                    on_progress(pct);
                }
            }
        } else {
            warn!("yt-dlp stdout unavailable; progress will not be reported");
        }

        let status = child
            .wait()
            .await
            .map_err(|e| HentError::Extraction(format!("yt-dlp wait failed: {}", e)))?;

        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(HentError::Extraction(format!(
                "yt-dlp exited with {}: {}",
                status, stderr_tail
            )));
        }

        Ok(())
    }
}

/// Parse one progress line into a percentage.
///
/// Lines look like `hent|1048576|4194304|NA` (downloaded, total, estimate).
/// When neither total nor estimate is known yet the divisor falls back to 1,
/// which pins the figure until yt-dlp learns the real size - an accepted
/// approximation, the value is clamped into range.
fn parse_progress_line(line: &str) -> Option<u8> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut parts = rest.split('|');

    let downloaded: f64 = parts.next()?.parse().ok()?;
    let total = parts.next().and_then(|v| v.parse::<f64>().ok());
    let estimate = parts.next().and_then(|v| v.parse::<f64>().ok());

    let divisor = total.or(estimate).filter(|v| *v > 0.0).unwrap_or(1.0);
    let pct = (downloaded / divisor * 100.0).floor();

    Some(pct.clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_with_total() {
        assert_eq!(parse_progress_line("hent|50|100|NA"), Some(50));
        assert_eq!(parse_progress_line("hent|1048576|4194304|NA"), Some(25));
        assert_eq!(parse_progress_line("hent|100|100|NA"), Some(100));
    }

    #[test]
    fn test_parse_progress_falls_back_to_estimate() {
        assert_eq!(parse_progress_line("hent|75|NA|300"), Some(25));
    }

    #[test]
    fn test_parse_progress_unknown_total_clamps() {
        // No total at all: the placeholder divisor of 1 overshoots, the
        // value is clamped rather than wrapping.
        assert_eq!(parse_progress_line("hent|12345|NA|NA"), Some(100));
        assert_eq!(parse_progress_line("hent|0|NA|NA"), Some(0));
    }

    #[test]
    fn test_parse_progress_ignores_other_lines() {
        assert_eq!(parse_progress_line("[download] Destination: temp.m4a"), None);
        assert_eq!(parse_progress_line(""), None);
        assert_eq!(parse_progress_line("hent|not-a-number|1|1"), None);
    }
}
