//! Pre-flight checks before serving.
//!
//! Validates that the external tools the download pipeline shells out to
//! are available, so a job doesn't fail midway for a missing binary.

use crate::error::{HentError, Result};
use std::process::Command;

/// Check that yt-dlp and ffmpeg are on the PATH.
pub fn check() -> Result<()> {
    check_tool("yt-dlp")?;
    check_tool("ffmpeg")?;
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(HentError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HentError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(HentError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
