use rustyline::error::ReadlineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} environment variable not set")]
    Configuration(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("Error initializing OpenAI client: {0}")]
    ClientInit(String),

    #[error("Error getting AI response: {0}")]
    CompletionRequest(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("Unknown error: {0}")]
    Other(String),
}

impl AppError {
    pub fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }

    /// Error for a required environment variable that is missing or empty.
    pub fn missing_var(name: &str) -> Self {
        Self::Configuration(name.to_string())
    }

    /// Wraps any failure raised while building the completion client.
    /// Configuration errors keep their own wording.
    pub fn into_client_init(self) -> Self {
        match self {
            e @ (AppError::Configuration(_) | AppError::ClientInit(_)) => e,
            other => AppError::ClientInit(other.to_string()),
        }
    }

    /// Wraps any failure raised by the completion call.
    pub fn into_completion_request(self) -> Self {
        match self {
            e @ AppError::CompletionRequest(_) => e,
            other => AppError::CompletionRequest(other.to_string()),
        }
    }
}
