//! Chat provider client configuration with sensible defaults.
//!
//! The chat provider speaks the OpenAI wire format behind a configurable
//! base URL, so any OpenAI-compatible gateway works.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for chat API requests (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create a chat client against the given API base.
///
/// The API key is read from the named environment variable; an absent key
/// is left empty and surfaces as an auth error from the provider.
pub fn create_client(api_base: &str, api_key_env: &str) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    let config = OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(std::env::var(api_key_env).unwrap_or_default());

    Client::with_config(config).with_http_client(http_client)
}
