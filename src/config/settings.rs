//! Configuration settings for Hent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub downloader: DownloaderSettings,
    pub chat: ChatSettings,
    pub tts: TtsSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for intermediate download files.
    pub work_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.hent".to_string(),
            work_dir: "/tmp/hent".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Download pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderSettings {
    /// Directory holding the deliverable file awaiting pickup,
    /// relative to the data directory.
    pub serve_dir: String,
    /// Download log file, relative to the data directory.
    pub history_file: String,
    /// Maximum number of retained log lines.
    pub max_history_entries: usize,
    /// Maximum media duration accepted at info-fetch time (in seconds).
    pub max_duration_seconds: u32,
    /// Audio bitrate passed to the extractor for mp3 downloads.
    pub audio_quality: String,
    /// Resolution cap for mp4 downloads.
    pub max_video_height: u32,
    /// File stem for intermediate files in the work directory.
    pub output_stem: String,
    /// Interval between file-readiness checks (in milliseconds).
    pub poll_interval_ms: u64,
    /// Total budget for waiting on a deliverable file (in seconds).
    pub max_wait_seconds: u64,
    /// Delay before the serve directory is emptied after a serve (in seconds).
    pub cleanup_delay_seconds: u64,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            serve_dir: "downloads".to_string(),
            history_file: "download_log.txt".to_string(),
            max_history_entries: 50,
            max_duration_seconds: 10800, // 3 hours
            audio_quality: "64K".to_string(),
            max_video_height: 360,
            output_stem: "temp".to_string(),
            poll_interval_ms: 500,
            max_wait_seconds: 10,
            cleanup_delay_seconds: 5,
        }
    }
}

/// Chat provider settings (OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Base URL of the chat completion API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Primary model for replies.
    pub model: String,
    /// Model tried when the primary one fails.
    pub fallback_model: String,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
    /// Persona instructions sent as the system message.
    pub system_prompt: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_base: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "openai/gpt-4o".to_string(),
            fallback_model: "openai/gpt-3.5-turbo".to_string(),
            max_tokens: 300,
            system_prompt: "You are a warm, playful assistant. Keep replies short, \
                            friendly and conversational."
                .to_string(),
        }
    }
}

/// Text-to-speech provider settings (ElevenLabs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// Voice identifier. Falls back to the ELEVEN_VOICE_ID environment
    /// variable when empty.
    pub voice_id: String,
    /// TTS model identifier.
    pub model_id: String,
    /// Voice stability (0.0-1.0).
    pub stability: f32,
    /// Voice similarity boost (0.0-1.0).
    pub similarity_boost: f32,
    /// Output file for the synthesized reply, relative to the data directory.
    pub output_file: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            output_file: "reply.mp3".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hent")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded work directory path.
    pub fn work_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.work_dir)
    }

    /// Get the serve directory path (under the data directory).
    pub fn serve_dir(&self) -> PathBuf {
        self.data_dir().join(&self.downloader.serve_dir)
    }

    /// Get the download log file path (under the data directory).
    pub fn history_path(&self) -> PathBuf {
        self.data_dir().join(&self.downloader.history_file)
    }

    /// Get the synthesized-reply output path (under the data directory).
    pub fn tts_output_path(&self) -> PathBuf {
        self.data_dir().join(&self.tts.output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_download_contract() {
        let settings = Settings::default();
        assert_eq!(settings.downloader.max_duration_seconds, 10800);
        assert_eq!(settings.downloader.max_history_entries, 50);
        assert_eq!(settings.downloader.poll_interval_ms, 500);
        assert_eq!(settings.downloader.max_wait_seconds, 10);
        assert_eq!(settings.downloader.cleanup_delay_seconds, 5);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let settings = Settings::default();
        let serialized = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.downloader.output_stem, "temp");
        assert_eq!(parsed.chat.model, settings.chat.model);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.downloader.audio_quality = "128K".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.downloader.audio_quality, "128K");
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let loaded = Settings::load_from(Some(&PathBuf::from("/nonexistent/hent.toml"))).unwrap();
        assert_eq!(loaded.downloader.max_duration_seconds, 10800);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Settings = toml::from_str("[downloader]\nmax_video_height = 720\n").unwrap();
        assert_eq!(parsed.downloader.max_video_height, 720);
        assert_eq!(parsed.downloader.max_duration_seconds, 10800);
        assert_eq!(parsed.tts.model_id, "eleven_multilingual_v2");
    }
}
