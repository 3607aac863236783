//! Speech synthesis through the ElevenLabs API.

use crate::config::TtsSettings;
use crate::error::{HentError, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variables consulted when the config leaves them unset.
const API_KEY_ENV: &str = "ELEVEN_API_KEY";
const VOICE_ID_ENV: &str = "ELEVEN_VOICE_ID";

/// Text-to-speech collaborator that writes the synthesized reply to disk.
pub struct Speech {
    http: reqwest::Client,
    settings: TtsSettings,
    output_path: PathBuf,
}

impl Speech {
    pub fn new(settings: TtsSettings, output_path: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            output_path,
        }
    }

    /// Synthesize `text` and write the resulting mp3, returning its path.
    pub async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let voice_id = self.voice_id()?;
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            HentError::Config(format!("{} not set", API_KEY_ENV))
        })?;

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", voice_id);
        let body = serde_json::json!({
            "text": text,
            "model_id": self.settings.model_id,
            "voice_settings": {
                "stability": self.settings.stability,
                "similarity_boost": self.settings.similarity_boost,
            },
        });

        debug!("Synthesizing {} chars of speech", text.len());

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(HentError::Tts(format!(
                "TTS provider returned {}: {}",
                status, detail
            )));
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.output_path, &bytes)?;

        info!("Voice reply saved to {}", self.output_path.display());
        Ok(self.output_path.clone())
    }

    fn voice_id(&self) -> Result<String> {
        if !self.settings.voice_id.is_empty() {
            return Ok(self.settings.voice_id.clone());
        }
        std::env::var(VOICE_ID_ENV).map_err(|_| {
            HentError::Config(format!(
                "No TTS voice configured: set tts.voice_id or {}",
                VOICE_ID_ENV
            ))
        })
    }
}
