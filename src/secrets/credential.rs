use std::{
    collections::HashMap,
    env,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::{process::Command, sync::Mutex};

use crate::{AppError, AppResult};

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_TIMEOUT: Duration = Duration::from_secs(3);
/// Tokens closer than this to expiry are refreshed
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);
const CLI_TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: SystemTime,
}

impl AccessToken {
    pub fn new(token: String, expires_on: SystemTime) -> Self {
        Self { token, expires_on }
    }

    pub fn is_fresh(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN < self.expires_on
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens for Azure resources.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> AppResult<AccessToken>;

    fn name(&self) -> &'static str;
}

/// `https://vault.azure.net/.default` -> `https://vault.azure.net`
fn scope_to_resource(scope: &str) -> &str {
    scope.trim_end_matches("/.default")
}

fn unix_to_system_time(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Identity endpoints disagree on whether numbers are strings.
fn number_field(value: &Option<serde_json::Value>) -> Option<u64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<serde_json::Value>,
    expires_on: Option<serde_json::Value>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        let expires_on = if let Some(on) = number_field(&self.expires_on) {
            unix_to_system_time(on)
        } else if let Some(secs) = number_field(&self.expires_in) {
            SystemTime::now() + Duration::from_secs(secs)
        } else {
            SystemTime::now() + CLI_TOKEN_LIFETIME
        };
        AccessToken::new(self.access_token, expires_on)
    }
}

async fn read_token_response(response: reqwest::Response, source: &str) -> AppResult<AccessToken> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AppError::Credential(format!(
            "{} returned {}: {}",
            source, status, body
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(&body)?;
    Ok(parsed.into_access_token())
}

/// Service principal login from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and
/// `AZURE_CLIENT_SECRET`.
pub struct ClientSecretCredential {
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

impl ClientSecretCredential {
    pub fn new(
        authority_host: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            authority_host,
            tenant_id,
            client_id,
            client_secret,
            client: Client::new(),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> AppResult<AccessToken> {
        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await?;

        read_token_response(response, self.name()).await
    }

    fn name(&self) -> &'static str {
        "ClientSecretCredential"
    }
}

#[derive(Debug, Clone)]
enum ManagedIdentitySource {
    /// App Service, Functions and Container Apps
    AppService { endpoint: String, header: String },
    Imds { endpoint: String },
}

pub struct ManagedIdentityCredential {
    source: ManagedIdentitySource,
    client_id: Option<String>,
    client: Client,
}

impl ManagedIdentityCredential {
    pub fn app_service(endpoint: String, header: String, client_id: Option<String>) -> Self {
        Self {
            source: ManagedIdentitySource::AppService { endpoint, header },
            client_id,
            client: Client::new(),
        }
    }

    pub fn imds(endpoint: String, client_id: Option<String>) -> Self {
        Self {
            source: ManagedIdentitySource::Imds { endpoint },
            client_id,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn get_token(&self, scope: &str) -> AppResult<AccessToken> {
        let resource = scope_to_resource(scope);

        let request = match &self.source {
            ManagedIdentitySource::AppService { endpoint, header } => self
                .client
                .get(endpoint)
                .header("X-IDENTITY-HEADER", header)
                .query(&[("api-version", APP_SERVICE_API_VERSION), ("resource", resource)]),
            ManagedIdentitySource::Imds { endpoint } => self
                .client
                .get(endpoint)
                .header("Metadata", "true")
                .timeout(IMDS_TIMEOUT)
                .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)]),
        };

        let request = match &self.client_id {
            Some(client_id) => request.query(&[("client_id", client_id.as_str())]),
            None => request,
        };

        let response = request.send().await?;
        read_token_response(response, self.name()).await
    }

    fn name(&self) -> &'static str {
        "ManagedIdentityCredential"
    }
}

/// Token from a logged-in Azure CLI.
pub struct AzureCliCredential;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    #[serde(rename = "expires_on")]
    expires_on: Option<u64>,
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> AppResult<AccessToken> {
        let output = Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                scope_to_resource(scope),
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| AppError::Credential(format!("Azure CLI not available: {}", e)))?;

        if !output.status.success() {
            return Err(AppError::Credential(format!(
                "Azure CLI failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let parsed: CliTokenResponse = serde_json::from_slice(&output.stdout)?;
        let expires_on = parsed
            .expires_on
            .map(unix_to_system_time)
            .unwrap_or_else(|| SystemTime::now() + CLI_TOKEN_LIFETIME);

        Ok(AccessToken::new(parsed.access_token, expires_on))
    }

    fn name(&self) -> &'static str {
        "AzureCliCredential"
    }
}

/// Tries each configured identity source in turn and caches tokens per scope.
pub struct DefaultAzureCredential {
    sources: Vec<Box<dyn TokenCredential>>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl DefaultAzureCredential {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut sources: Vec<Box<dyn TokenCredential>> = Vec::new();

        if let (Some(tenant), Some(client_id), Some(secret)) = (
            read("AZURE_TENANT_ID"),
            read("AZURE_CLIENT_ID"),
            read("AZURE_CLIENT_SECRET"),
        ) {
            let authority =
                read("AZURE_AUTHORITY_HOST").unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
            sources.push(Box::new(ClientSecretCredential::new(
                authority, tenant, client_id, secret,
            )));
        }

        let client_id = read("AZURE_CLIENT_ID");
        match (read("IDENTITY_ENDPOINT"), read("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => sources.push(Box::new(
                ManagedIdentityCredential::app_service(endpoint, header, client_id),
            )),
            _ => sources.push(Box::new(ManagedIdentityCredential::imds(
                IMDS_ENDPOINT.to_string(),
                client_id,
            ))),
        }

        sources.push(Box::new(AzureCliCredential));

        Self::with_sources(sources)
    }

    pub fn with_sources(sources: Vec<Box<dyn TokenCredential>>) -> Self {
        Self {
            sources,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for DefaultAzureCredential {
    async fn get_token(&self, scope: &str) -> AppResult<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(scope).filter(|t| t.is_fresh()) {
            return Ok(token.clone());
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    log::info!("Acquired token for {} via {}", scope, source.name());
                    cache.insert(scope.to_string(), token.clone());
                    return Ok(token);
                }
                Err(e) => {
                    log::warn!("{} failed: {}", source.name(), e);
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(AppError::Credential(format!(
            "no credential source produced a token ({})",
            failures.join("; ")
        )))
    }

    fn name(&self) -> &'static str {
        "DefaultAzureCredential"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    const SCOPE: &str = "https://vault.azure.net/.default";

    struct StubCredential {
        calls: Arc<AtomicUsize>,
        result: Option<AccessToken>,
    }

    #[async_trait]
    impl TokenCredential for StubCredential {
        async fn get_token(&self, _scope: &str) -> AppResult<AccessToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| AppError::Credential("not configured".to_string()))
        }

        fn name(&self) -> &'static str {
            "StubCredential"
        }
    }

    fn stub(result: Option<AccessToken>) -> (Box<dyn TokenCredential>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(StubCredential {
                calls: calls.clone(),
                result,
            }),
            calls,
        )
    }

    fn token(value: &str, valid_for: Duration) -> AccessToken {
        AccessToken::new(value.to_string(), SystemTime::now() + valid_for)
    }

    #[test]
    fn test_scope_to_resource() {
        assert_eq!(scope_to_resource(SCOPE), "https://vault.azure.net");
    }

    #[test]
    fn test_token_freshness() {
        assert!(token("t", Duration::from_secs(3600)).is_fresh());
        assert!(!token("t", Duration::from_secs(60)).is_fresh());
    }

    #[test]
    fn test_chain_order_from_environment() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AZURE_TENANT_ID", "tenant"),
            ("AZURE_CLIENT_ID", "client"),
            ("AZURE_CLIENT_SECRET", "secret"),
            ("IDENTITY_ENDPOINT", "http://localhost:42356/msi/token"),
            ("IDENTITY_HEADER", "header"),
        ]);
        let chain = DefaultAzureCredential::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(
            chain.source_names(),
            vec![
                "ClientSecretCredential",
                "ManagedIdentityCredential",
                "AzureCliCredential"
            ]
        );
    }

    #[test]
    fn test_chain_skips_unconfigured_client_secret() {
        let vars: HashMap<&str, &str> = HashMap::from([("AZURE_TENANT_ID", "tenant")]);
        let chain = DefaultAzureCredential::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(
            chain.source_names(),
            vec!["ManagedIdentityCredential", "AzureCliCredential"]
        );
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_source() {
        let (failing, failing_calls) = stub(None);
        let (working, working_calls) = stub(Some(token("abc", Duration::from_secs(3600))));
        let chain = DefaultAzureCredential::with_sources(vec![failing, working]);

        let result = chain.get_token(SCOPE).await.unwrap();

        assert_eq!(result.token, "abc");
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(working_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chain_caches_fresh_tokens() {
        let (working, calls) = stub(Some(token("abc", Duration::from_secs(3600))));
        let chain = DefaultAzureCredential::with_sources(vec![working]);

        chain.get_token(SCOPE).await.unwrap();
        chain.get_token(SCOPE).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chain_refreshes_tokens_near_expiry() {
        let (working, calls) = stub(Some(token("abc", Duration::from_secs(30))));
        let chain = DefaultAzureCredential::with_sources(vec![working]);

        chain.get_token(SCOPE).await.unwrap();
        chain.get_token(SCOPE).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_chain_reports_every_failure() {
        let (first, _) = stub(None);
        let (second, _) = stub(None);
        let chain = DefaultAzureCredential::with_sources(vec![first, second]);

        let err = chain.get_token(SCOPE).await.unwrap_err();

        assert!(matches!(err, AppError::Credential(_)));
        assert_eq!(err.to_string().matches("StubCredential").count(), 2);
    }

    #[tokio::test]
    async fn test_client_secret_credential_posts_form() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/tenant-id/oauth2/v2.0/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                Matcher::UrlEncoded("client_id".into(), "client-id".into()),
                Matcher::UrlEncoded("scope".into(), SCOPE.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type": "Bearer", "expires_in": 3599, "access_token": "sp-token"}"#)
            .create_async()
            .await;

        let credential = ClientSecretCredential::new(
            server.url(),
            "tenant-id".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
        );
        let result = credential.get_token(SCOPE).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.token, "sp-token");
        assert!(result.is_fresh());
    }

    #[tokio::test]
    async fn test_app_service_managed_identity() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/msi/token")
            .match_header("X-IDENTITY-HEADER", "secret-header")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "2019-08-01".into()),
                Matcher::UrlEncoded("resource".into(), "https://vault.azure.net".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "mi-token", "expires_on": "4102444800", "resource": "https://vault.azure.net"}"#)
            .create_async()
            .await;

        let credential = ManagedIdentityCredential::app_service(
            format!("{}/msi/token", server.url()),
            "secret-header".to_string(),
            None,
        );
        let result = credential.get_token(SCOPE).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.token, "mi-token");
        assert_eq!(result.expires_on, unix_to_system_time(4102444800));
    }

    #[tokio::test]
    async fn test_managed_identity_error_status() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/metadata/identity/oauth2/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": "invalid_request", "error_description": "Identity not found"}"#)
            .create_async()
            .await;

        let credential = ManagedIdentityCredential::imds(
            format!("{}/metadata/identity/oauth2/token", server.url()),
            None,
        );
        let err = credential.get_token(SCOPE).await.unwrap_err();

        assert!(matches!(err, AppError::Credential(_)));
        assert!(err.to_string().contains("Identity not found"));
    }
}
