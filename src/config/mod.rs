//! Configuration management for Hent.

mod settings;

pub use settings::{ChatSettings, DownloaderSettings, GeneralSettings, Settings, TtsSettings};
