//! Cover art and title embedding for audio files.
//!
//! Fetches the thumbnail over HTTP and remuxes it into the mp3 with ffmpeg
//! as an attached picture, alongside a title tag. The job controller treats
//! failures here as non-fatal.

use super::TagWriter;
use crate::error::{HentError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Tag-embedding collaborator backed by ffmpeg.
pub struct FfmpegTagger {
    http: reqwest::Client,
}

impl FfmpegTagger {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for FfmpegTagger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagWriter for FfmpegTagger {
    async fn embed(&self, file: &Path, thumbnail_url: Option<&str>, title: &str) -> Result<()> {
        // ffmpeg can't edit in place; write next to the source and swap.
        let tagged = file.with_extension("tagged.mp3");

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-i").arg(file);

        let cover = match thumbnail_url {
            Some(url) => {
                debug!("Fetching cover art from {}", url);
                let bytes = self
                    .http
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                let cover_path = file.with_extension("cover.jpg");
                std::fs::write(&cover_path, &bytes)?;

                cmd.arg("-i")
                    .arg(&cover_path)
                    .arg("-map")
                    .arg("0:a")
                    .arg("-map")
                    .arg("1")
                    .arg("-c")
                    .arg("copy")
                    .arg("-disposition:v")
                    .arg("attached_pic")
                    .arg("-metadata:s:v")
                    .arg("title=Cover");
                Some(cover_path)
            }
            None => {
                cmd.arg("-c").arg("copy");
                None
            }
        };

        cmd.arg("-id3v2_version")
            .arg("3")
            .arg("-metadata")
            .arg(format!("title={}", title))
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg(&tagged)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let result = cmd.output().await;

        if let Some(cover_path) = cover {
            let _ = std::fs::remove_file(cover_path);
        }

        match result {
            Ok(out) if out.status.success() => {
                std::fs::rename(&tagged, file)?;
                Ok(())
            }
            Ok(out) => {
                let _ = std::fs::remove_file(&tagged);
                let err = String::from_utf8_lossy(&out.stderr);
                Err(HentError::Tagging(format!("ffmpeg failed: {}", err.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HentError::ToolNotFound("ffmpeg".to_string()))
            }
            Err(e) => Err(HentError::Tagging(format!("ffmpeg error: {}", e))),
        }
    }
}
