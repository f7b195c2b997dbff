pub mod config;
pub mod provider;
pub mod types;

pub use config::AzureOpenAIConfig;
pub use provider::AzureOpenAIProvider;

pub type AzureOpenAIClient = crate::model::AIClient<AzureOpenAIProvider>;
