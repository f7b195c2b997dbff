pub mod azure_openai;

pub use azure_openai::{AzureOpenAIClient, AzureOpenAIConfig, AzureOpenAIProvider};
