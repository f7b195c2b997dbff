use super::config::AzureOpenAIConfig;
use super::types::*;
use crate::{
    AppError, AppResult,
    model::{GenerateResult, Message, ModelProvider},
    streaming::{OutputStreamer, StreamEvent},
};
use async_trait::async_trait;
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct AzureOpenAIProvider {
    client: Client,
}

impl AzureOpenAIProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn build_request(messages: &[Message], config: &AzureOpenAIConfig) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: config.deployment.clone(),
            messages: messages.iter().map(|m| m.into()).collect(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    fn error_from_body(status: reqwest::StatusCode, body: &str) -> AppError {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(parsed) => {
                let code = match parsed.error.code {
                    Some(serde_json::Value::String(code)) => code,
                    Some(other) => other.to_string(),
                    None => status.as_u16().to_string(),
                };
                AppError::CompletionRequest(format!(
                    "Error code: {} - {}",
                    code, parsed.error.message
                ))
            }
            Err(_) => AppError::CompletionRequest(format!("Error code: {} - {}", status.as_u16(), body)),
        }
    }

    fn first_choice(response: ChatCompletionResponse) -> AppResult<GenerateResult> {
        let usage = response.usage.map(Into::into);
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::CompletionRequest("response contained no choices".to_string()))?;

        if let Some(reason) = &choice.finish_reason {
            log::debug!("Finish reason: {}", reason);
        }

        let response = choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| {
                AppError::CompletionRequest("response contained no message content".to_string())
            })?;

        Ok(GenerateResult { response, usage })
    }
}

impl Default for AzureOpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for AzureOpenAIProvider {
    type Config = AzureOpenAIConfig;

    async fn generate(
        &self,
        messages: &[Message],
        config: &Self::Config,
        streamer: &mut dyn OutputStreamer,
    ) -> AppResult<GenerateResult> {
        streamer
            .handle_event(StreamEvent::Progress("Antwoord ophalen...".to_string()))
            .await?;

        let request = Self::build_request(messages, config);

        let response = self
            .client
            .post(config.completions_url())
            .query(&[("api-version", config.api_version.as_str())])
            .header("api-key", config.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::CompletionRequest(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::CompletionRequest(e.to_string()))?;

        if !status.is_success() {
            log::error!("Completion request failed with status {}", status);
            return Err(Self::error_from_body(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::CompletionRequest(format!("invalid response body: {}", e)))?;

        Self::first_choice(parsed)
    }

    fn provider_name(&self) -> &'static str {
        "azure-openai"
    }
}
