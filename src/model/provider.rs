use super::Message;
use crate::{AppResult, streaming::OutputStreamer};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub response: String,
    pub usage: Option<TokenUsage>,
}

pub trait ModelConfig: Send + Sync + Clone + std::fmt::Debug {
    fn model_name(&self) -> &str;

    fn validate(&self) -> AppResult<()>;
}

#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    type Config: ModelConfig;

    /// Sends the full message list and returns the first choice.
    async fn generate(
        &self,
        messages: &[Message],
        config: &Self::Config,
        streamer: &mut dyn OutputStreamer,
    ) -> AppResult<GenerateResult>;

    fn provider_name(&self) -> &'static str;
}
