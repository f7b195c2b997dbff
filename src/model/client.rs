use super::{Message, ModelConfig, ModelProvider};
use crate::{AppError, AppResult, streaming::OutputStreamer};

/// Configured handle to a completion service.
///
/// Built once and shared read-only, so every method takes `&self`.
#[derive(Debug)]
pub struct AIClient<P: ModelProvider> {
    provider: P,
    config: P::Config,
}

impl<P: ModelProvider> AIClient<P> {
    pub fn builder() -> AIClientBuilder<P> {
        AIClientBuilder::new()
    }

    pub async fn complete(
        &self,
        messages: &[Message],
        streamer: &mut dyn OutputStreamer,
    ) -> AppResult<String> {
        log::debug!(
            "Sending {} messages to {} ({})",
            messages.len(),
            self.provider.provider_name(),
            self.config.model_name()
        );

        let result = self
            .provider
            .generate(messages, &self.config, streamer)
            .await?;

        if let Some(usage) = &result.usage {
            log::info!(
                "Completion used {} tokens ({} prompt, {} completion)",
                usage.total_tokens,
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(result.response)
    }

    pub fn config(&self) -> &P::Config {
        &self.config
    }
}

pub struct AIClientBuilder<P: ModelProvider> {
    provider: Option<P>,
    config: Option<P::Config>,
}

impl<P: ModelProvider> AIClientBuilder<P> {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: None,
        }
    }

    pub fn provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: P::Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> AppResult<AIClient<P>> {
        let provider = self
            .provider
            .ok_or_else(|| AppError::from("Provider is required"))?;
        let config = self
            .config
            .ok_or_else(|| AppError::from("Config is required"))?;

        config.validate()?;

        Ok(AIClient { provider, config })
    }
}

impl<P: ModelProvider> Default for AIClientBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
