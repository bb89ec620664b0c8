//! Completion client: falls back to the language model for unmatched input.

use crate::history::ConversationLog;
use parley_config::AppConfig;
use parley_core::error::ProviderError;
use parley_core::message::Message;
use parley_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, error};

/// Returned whenever the completion call fails for any reason.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble processing that right now. Please try again.";

/// Wraps a [`Provider`] with the assistant's prompt and request settings.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    context_messages: usize,
    system_prompt: String,
}

impl CompletionClient {
    /// Create a client with default settings for the given assistant name.
    pub fn new(provider: Arc<dyn Provider>, assistant_name: &str) -> Self {
        Self {
            provider,
            model: "gpt-3.5-turbo".into(),
            temperature: 0.7,
            max_tokens: Some(150),
            context_messages: 10,
            system_prompt: system_prompt(assistant_name),
        }
    }

    /// Create a client with model settings taken from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.assistant.name)
            .with_model(config.effective_model())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_context_messages(config.assistant.context_messages)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// How many trailing log entries accompany the system prompt.
    pub fn with_context_messages(mut self, n: usize) -> Self {
        self.context_messages = n;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request: system prompt, then the trailing log entries.
    pub fn build_request(&self, log: &ConversationLog) -> ProviderRequest {
        let mut messages = Vec::with_capacity(self.context_messages + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(log.last_n(self.context_messages).cloned());

        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Ask the provider for a reply to the conversation so far.
    ///
    /// Never fails: any provider error is logged and replaced by
    /// [`FALLBACK_REPLY`].
    pub async fn complete(&self, log: &ConversationLog) -> String {
        match self.try_complete(log).await {
            Ok(text) => text,
            Err(e) => {
                error!(provider = %self.provider.name(), "Completion failed: {e}");
                FALLBACK_REPLY.into()
            }
        }
    }

    async fn try_complete(&self, log: &ConversationLog) -> Result<String, ProviderError> {
        let request = self.build_request(log);
        debug!(
            provider = %self.provider.name(),
            model = %request.model,
            messages = request.messages.len(),
            "Requesting completion"
        );

        let response = self.provider.complete(request).await?;
        let text = response.message.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyCompletion(response.model));
        }
        Ok(text.to_string())
    }
}

fn system_prompt(name: &str) -> String {
    format!(
        "You are {name}, a helpful virtual assistant. Keep responses concise but friendly. \
         If asked about capabilities, mention weather, time, calculations, reminders, and jokes."
    )
}
