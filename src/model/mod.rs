pub mod client;
mod message;
mod provider;
mod transcript;

pub use client::AIClient;
pub use message::{Message, MessageRole};
pub use provider::{GenerateResult, ModelConfig, ModelProvider, TokenUsage};
pub use transcript::Transcript;
