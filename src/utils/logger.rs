use crate::AppError;
use flexi_logger::{FileSpec, FlexiLoggerError, Logger, LoggerHandle, WriteMode};

/// Logs go to `helpdesk.log` in the working directory so they never mix
/// with the chat on stdout. `RUST_LOG` overrides the level.
pub fn logger_init() -> Result<LoggerHandle, AppError> {
    let logger = Logger::try_with_env_or_str("info")?
        .log_to_file(FileSpec::default().basename("helpdesk").suppress_timestamp())
        .append()
        .write_mode(WriteMode::BufferAndFlush)
        .duplicate_to_stderr(flexi_logger::Duplicate::None)
        .start()?;

    Ok(logger)
}

impl From<FlexiLoggerError> for AppError {
    fn from(e: FlexiLoggerError) -> Self {
        AppError::Other(e.to_string())
    }
}
