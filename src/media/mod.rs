//! Media extraction, transcoding and tagging collaborators.
//!
//! The download pipeline talks to external tools (yt-dlp, ffmpeg) through
//! the [`MediaExtractor`] and [`TagWriter`] traits so the job controller can
//! be exercised without them.

pub mod format;
mod tagger;
mod ytdlp;

pub use tagger::FfmpegTagger;
pub use ytdlp::YtDlpExtractor;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Target format for a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Mp3,
    Mp4,
}

impl DownloadFormat {
    /// File extension for the deliverable.
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Mp3 => "mp3",
            DownloadFormat::Mp4 => "mp4",
        }
    }

    /// Uppercase label used in the download log.
    pub fn label(&self) -> &'static str {
        match self {
            DownloadFormat::Mp3 => "MP3",
            DownloadFormat::Mp4 => "MP4",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, DownloadFormat::Mp3)
    }
}

impl std::str::FromStr for DownloadFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(DownloadFormat::Mp3),
            "mp4" => Ok(DownloadFormat::Mp4),
            _ => Err(format!("Unknown download format: {}", s)),
        }
    }
}

impl std::fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Metadata reported by the extractor before or during a download.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<u32>,
}

/// Callback invoked with the current download percentage (0-100).
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// External collaborator that fetches and converts media.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Fetch metadata for a URL without downloading.
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo>;

    /// Download and transcode media into the work directory, reporting
    /// progress through the callback. Output files are named by the
    /// extractor's template; the caller resolves the final path.
    async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        work_dir: &Path,
        on_progress: ProgressFn,
    ) -> Result<()>;
}

/// External collaborator that writes cover art and title metadata into an
/// audio file.
#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn embed(&self, file: &Path, thumbnail_url: Option<&str>, title: &str) -> Result<()>;
}

/// Guess a MIME type from a file's extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("m4a") => "audio/mp4",
        Some("webm") => "video/webm",
        Some("opus") | Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_parsing() {
        assert_eq!("mp3".parse::<DownloadFormat>(), Ok(DownloadFormat::Mp3));
        assert_eq!("MP4".parse::<DownloadFormat>(), Ok(DownloadFormat::Mp4));
        assert!("flac".parse::<DownloadFormat>().is_err());
        assert!("".parse::<DownloadFormat>().is_err());
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(DownloadFormat::Mp3.label(), "MP3");
        assert_eq!(DownloadFormat::Mp4.extension(), "mp4");
        assert!(DownloadFormat::Mp3.is_audio());
        assert!(!DownloadFormat::Mp4.is_audio());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(&PathBuf::from("Song Title.mp3")), "audio/mpeg");
        assert_eq!(mime_for_path(&PathBuf::from("clip.MP4")), "video/mp4");
        assert_eq!(mime_for_path(&PathBuf::from("unknown.bin")), "application/octet-stream");
        assert_eq!(mime_for_path(&PathBuf::from("no_extension")), "application/octet-stream");
    }
}
