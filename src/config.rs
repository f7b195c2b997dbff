use std::env;

pub const KEY_VAULT_NAME_VAR: &str = "KEY_VAULT_NAME";
pub const OPENAI_SERVICE_VAR: &str = "AZURE_OPENAI_SERVICE";
pub const OPENAI_DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const OPENAI_ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";

pub const DEFAULT_DEPLOYMENT: &str = "gpt-35-turbo";
pub const API_KEY_SECRET_NAME: &str = "OpenAI-API-Key";

const KEY_VAULT_DOMAIN: &str = "vault.azure.net";
const OPENAI_DOMAIN: &str = "openai.azure.com";

/// Values read from the environment once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub key_vault_name: Option<String>,
    pub openai_service: Option<String>,
    pub openai_endpoint: Option<String>,
    pub deployment: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from any variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            key_vault_name: read(KEY_VAULT_NAME_VAR),
            openai_service: read(OPENAI_SERVICE_VAR),
            openai_endpoint: read(OPENAI_ENDPOINT_VAR),
            deployment: read(OPENAI_DEPLOYMENT_VAR)
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
        }
    }

    pub fn key_vault_url(&self) -> Option<String> {
        self.key_vault_name
            .as_deref()
            .map(|name| format!("https://{}.{}/", name, KEY_VAULT_DOMAIN))
    }

    /// Endpoint of the completion service, with a trailing slash.
    pub fn openai_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.openai_endpoint {
            return Some(format!("{}/", endpoint.trim_end_matches('/')));
        }

        self.openai_service
            .as_deref()
            .map(|service| format!("https://{}.{}/", service, OPENAI_DOMAIN))
    }
}
