use crate::{AppResult, model::MessageRole};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A complete, labeled turn of the transcript
    Message { role: MessageRole, content: String },
    /// Transient line shown while a request is in flight
    Progress(String),
    /// Inline failure banner
    Error(String),
    Finished,
}

#[async_trait]
pub trait OutputStreamer: Send + Sync {
    async fn handle_event(&mut self, event: StreamEvent) -> AppResult<()>;
    async fn finish(&mut self) -> AppResult<()>;
}
