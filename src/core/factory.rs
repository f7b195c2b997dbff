use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{
    AppError, AppResult,
    config::{API_KEY_SECRET_NAME, KEY_VAULT_NAME_VAR, OPENAI_SERVICE_VAR, Settings},
    model::AIClient,
    providers::{AzureOpenAIClient, AzureOpenAIConfig, AzureOpenAIProvider},
    secrets::{DefaultAzureCredential, KeyVaultSecretResolver, SecretResolver},
    streaming::{OutputStreamer, StreamEvent},
};

/// Builds the completion client on first use and hands out the same
/// outcome for the rest of the process. A failed build is remembered too.
pub struct ClientFactory {
    settings: Settings,
    resolver: Arc<dyn SecretResolver>,
    client: OnceCell<Option<Arc<AzureOpenAIClient>>>,
}

impl ClientFactory {
    pub fn new(settings: Settings, resolver: Arc<dyn SecretResolver>) -> Self {
        Self {
            settings,
            resolver,
            client: OnceCell::new(),
        }
    }

    /// Factory backed by Key Vault and the ambient Azure identity.
    pub fn from_settings(settings: Settings) -> Self {
        let credential = Arc::new(DefaultAzureCredential::from_env());
        Self::new(settings, Arc::new(KeyVaultSecretResolver::new(credential)))
    }

    /// Returns the shared client, or `None` when it could not be built. The
    /// build failure is shown on `streamer` by the call that attempted it;
    /// later calls return `None` without trying again. Only display errors
    /// are returned as `Err`.
    pub async fn get_client(
        &self,
        streamer: &mut dyn OutputStreamer,
    ) -> AppResult<Option<Arc<AzureOpenAIClient>>> {
        let mut failure = None;
        let slot = &mut failure;
        let client = self
            .client
            .get_or_init(|| async move {
                match self.build_client().await {
                    Ok(client) => Some(client),
                    Err(e) => {
                        let e = e.into_client_init();
                        log::error!("Client initialization failed: {}", e);
                        *slot = Some(e);
                        None
                    }
                }
            })
            .await
            .clone();

        if let Some(e) = failure {
            streamer.handle_event(StreamEvent::Error(e.to_string())).await?;
        }
        Ok(client)
    }

    async fn resolve_api_key(&self) -> AppResult<String> {
        let vault_url = self
            .settings
            .key_vault_url()
            .ok_or_else(|| AppError::missing_var(KEY_VAULT_NAME_VAR))?;

        self.resolver
            .resolve(&vault_url, API_KEY_SECRET_NAME)
            .await
    }

    async fn build_client(&self) -> AppResult<Arc<AzureOpenAIClient>> {
        let api_key = self.resolve_api_key().await?;

        if self.settings.openai_service.is_none() {
            return Err(AppError::missing_var(OPENAI_SERVICE_VAR));
        }
        let endpoint = self
            .settings
            .openai_endpoint()
            .ok_or_else(|| AppError::missing_var(OPENAI_SERVICE_VAR))?;

        let config = AzureOpenAIConfig::builder()
            .endpoint(endpoint)
            .deployment(self.settings.deployment.clone())
            .api_key(api_key)
            .build()?;

        log::info!("Built completion client: {:?}", config);

        let client = AIClient::builder()
            .provider(AzureOpenAIProvider::new())
            .config(config)
            .build()?;

        Ok(Arc::new(client))
    }
}
