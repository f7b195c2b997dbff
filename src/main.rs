use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;

mod cli;
mod config;
mod core;
mod error;
mod model;
mod providers;
mod secrets;
mod streaming;
mod utils;

pub use crate::cli::Cli;
pub use crate::error::AppError;
pub type AppResult<T, E = crate::error::AppError> = std::result::Result<T, E>;

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenv().ok();
    let _logger = utils::logger_init().ok();
    log::info!("Starting helpdesk...");

    let _cli = Cli::parse();

    let settings = config::Settings::from_env();
    log::info!(
        "Using deployment {} (key vault configured: {}, service configured: {})",
        settings.deployment,
        settings.key_vault_name.is_some(),
        settings.openai_service.is_some()
    );

    let factory = Arc::new(core::ClientFactory::from_settings(settings));
    core::chat::run(factory).await
}
