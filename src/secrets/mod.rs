pub mod credential;
pub mod key_vault;

pub use credential::DefaultAzureCredential;
pub use key_vault::{KeyVaultSecretResolver, SecretResolver};

#[cfg(test)]
pub mod testing {
    use super::SecretResolver;
    use crate::{AppError, AppResult};
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// Resolver that hands out a fixed secret and counts lookups.
    pub struct StubResolver {
        secret: Option<String>,
        calls: AtomicUsize,
        pub requests: Mutex<Vec<(String, String)>>,
    }

    impl StubResolver {
        pub fn returning(secret: &str) -> Self {
            Self {
                secret: Some(secret.to_string()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                secret: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SecretResolver for StubResolver {
        async fn resolve(&self, vault_url: &str, secret_name: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((vault_url.to_string(), secret_name.to_string()));
            self.secret
                .clone()
                .ok_or_else(|| AppError::SecretStore("Caller is not authorized".to_string()))
        }
    }
}
