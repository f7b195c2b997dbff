use std::fmt;

use crate::{AppError, AppResult, model::ModelConfig};

pub const API_VERSION: &str = "2024-02-01";
pub const MAX_TOKENS: u32 = 500;
pub const TEMPERATURE: f64 = 0.7;

#[derive(Clone)]
pub struct AzureOpenAIConfig {
    /// Service endpoint with a trailing slash
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f64,
    api_key: String,
}

impl AzureOpenAIConfig {
    pub fn builder() -> AzureOpenAIConfigBuilder {
        AzureOpenAIConfigBuilder::new()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            self.deployment
        )
    }
}

// Keeps the key out of logs
impl fmt::Debug for AzureOpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAIConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ModelConfig for AzureOpenAIConfig {
    fn model_name(&self) -> &str {
        &self.deployment
    }

    fn validate(&self) -> AppResult<()> {
        if self.endpoint.is_empty() {
            return Err(AppError::from("Endpoint cannot be empty"));
        }
        if self.deployment.is_empty() {
            return Err(AppError::from("Deployment name cannot be empty"));
        }
        if self.api_key.is_empty() {
            return Err(AppError::from("API key cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AzureOpenAIConfigBuilder {
    endpoint: Option<String>,
    deployment: Option<String>,
    api_key: Option<String>,
}

impl AzureOpenAIConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn deployment(mut self, deployment: String) -> Self {
        self.deployment = Some(deployment);
        self
    }

    pub fn api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn build(self) -> AppResult<AzureOpenAIConfig> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| AppError::from("Endpoint is required"))?;
        let deployment = self
            .deployment
            .ok_or_else(|| AppError::from("Deployment is required"))?;
        let api_key = self
            .api_key
            .ok_or_else(|| AppError::from("API key is required"))?;

        Ok(AzureOpenAIConfig {
            endpoint,
            deployment,
            api_version: API_VERSION.to_string(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AzureOpenAIConfig {
        AzureOpenAIConfig::builder()
            .endpoint("https://oai-helpdesk.openai.azure.com/".to_string())
            .deployment("gpt-35-turbo".to_string())
            .api_key("secret-key".to_string())
            .build()
            .unwrap()
    }

    #[test]
    fn test_fixed_parameters() {
        let config = config();
        assert_eq!(config.api_version, "2024-02-01");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.temperature, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            config().completions_url(),
            "https://oai-helpdesk.openai.azure.com/openai/deployments/gpt-35-turbo/chat/completions"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_build_requires_api_key() {
        let result = AzureOpenAIConfig::builder()
            .endpoint("https://x.openai.azure.com/".to_string())
            .deployment("gpt-35-turbo".to_string())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let config = AzureOpenAIConfig::builder()
            .endpoint("https://x.openai.azure.com/".to_string())
            .deployment("gpt-35-turbo".to_string())
            .api_key(String::new())
            .build()
            .unwrap();
        assert!(config.validate().is_err());
    }
}
