//! LLM chat with model fallback.
//!
//! Forwards a user message to the configured chat model and falls back to a
//! cheaper model when the primary one fails (quota, availability, or any
//! other provider error).

use crate::config::ChatSettings;
use crate::error::{HentError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use tracing::{debug, info, warn};

/// Canned reply when both models fail; the endpoint never surfaces a 5xx
/// for a provider outage.
const FALLBACK_REPLY: &str =
    "Sorry, I couldn't reach the language model right now. Please try again in a moment.";

/// Chat engine with a primary model and a fallback.
pub struct ChatEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    settings: ChatSettings,
}

impl ChatEngine {
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            client: create_client(&settings.api_base, &settings.api_key_env),
            settings,
        }
    }

    /// Generate a reply for a single user message.
    pub async fn reply(&self, message: &str) -> Result<String> {
        match self.complete(&self.settings.model, message).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(
                    "Model {} failed ({}), trying fallback {}",
                    self.settings.model, e, self.settings.fallback_model
                );
                self.complete(&self.settings.fallback_model, message).await
            }
        }
    }

    /// Reply used when the provider is unreachable.
    pub fn fallback_reply(&self) -> &'static str {
        FALLBACK_REPLY
    }

    async fn complete(&self, model: &str, message: &str) -> Result<String> {
        info!("Requesting completion from {}", model);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.settings.system_prompt.clone())
                .build()
                .map_err(|e| HentError::Chat(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()
                .map_err(|e| HentError::Chat(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .max_tokens(self.settings.max_tokens)
            .messages(messages)
            .build()
            .map_err(|e| HentError::Chat(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HentError::Chat(format!("Completion request failed: {}", e)))?;

        let reply = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| HentError::Chat("Empty response from model".to_string()))?
            .clone();

        debug!("Received {} chars from {}", reply.len(), model);
        Ok(reply)
    }
}
