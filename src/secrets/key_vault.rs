use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::credential::TokenCredential;
use crate::{AppError, AppResult};

pub const KEY_VAULT_API_VERSION: &str = "7.4";
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Reads a named secret from a secret store.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, vault_url: &str, secret_name: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyVaultErrorResponse {
    error: KeyVaultErrorBody,
}

#[derive(Debug, Deserialize)]
struct KeyVaultErrorBody {
    code: String,
    message: String,
}

pub struct KeyVaultSecretResolver {
    credential: Arc<dyn TokenCredential>,
    client: Client,
}

impl KeyVaultSecretResolver {
    pub fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            credential,
            client: Client::new(),
        }
    }

    fn secret_url(vault_url: &str, secret_name: &str) -> String {
        format!("{}/secrets/{}", vault_url.trim_end_matches('/'), secret_name)
    }
}

#[async_trait]
impl SecretResolver for KeyVaultSecretResolver {
    async fn resolve(&self, vault_url: &str, secret_name: &str) -> AppResult<String> {
        let token = self.credential.get_token(KEY_VAULT_SCOPE).await?;

        log::info!("Reading secret {} from {}", secret_name, vault_url);
        let response = self
            .client
            .get(Self::secret_url(vault_url, secret_name))
            .query(&[("api-version", KEY_VAULT_API_VERSION)])
            .bearer_auth(&token.token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<KeyVaultErrorResponse>(&body) {
                Ok(parsed) => format!("{} ({})", parsed.error.message, parsed.error.code),
                Err(_) => format!("{} returned {}", vault_url, status),
            };
            return Err(AppError::SecretStore(detail));
        }

        let bundle: SecretBundle = serde_json::from_str(&body)?;
        bundle
            .value
            .ok_or_else(|| AppError::SecretStore(format!("secret {} has no value", secret_name)))
    }
}
