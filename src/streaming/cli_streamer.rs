use std::io::{self, Write};

use log::{debug, error, info};

use super::streamer::{OutputStreamer, StreamEvent};
use crate::{error::AppError, model::MessageRole};

pub struct CliStreamer {
    pub show_progress: bool,
}

impl CliStreamer {
    pub fn new(new_show_progress: bool) -> Self {
        CliStreamer {
            show_progress: new_show_progress,
        }
    }

    pub fn label(role: MessageRole) -> &'static str {
        match role {
            MessageRole::User => "🧑 Jij",
            MessageRole::Assistant => "🤖 Assistent",
            MessageRole::System => "⚙️ Systeem",
        }
    }

    pub fn format_message(role: MessageRole, content: &str) -> String {
        format!("{}: {}", Self::label(role), content)
    }

    pub fn format_error(error: &str) -> String {
        format!("❌ {}", error)
    }

    fn format_progress(message: &str) -> String {
        format!("⏳ {}", message)
    }

    pub fn write(&mut self, data: &str) -> Result<(), AppError> {
        print!("{}", data);
        io::stdout().flush()?;
        Ok(())
    }

    pub fn write_message(&mut self, message: &str) -> Result<(), AppError> {
        println!("{}", message);
        io::stdout().flush()?;
        Ok(())
    }

    pub fn clear_line(&mut self) -> Result<(), AppError> {
        print!("\r\x1b[K");
        io::stdout().flush()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OutputStreamer for CliStreamer {
    async fn finish(&mut self) -> Result<(), AppError> {
        self.handle_event(StreamEvent::Finished).await
    }

    async fn handle_event(&mut self, event: StreamEvent) -> Result<(), AppError> {
        debug!("{:?}", event);
        match event {
            StreamEvent::Message { role, content } => {
                if self.show_progress {
                    self.clear_line()?;
                }
                self.write_message(&Self::format_message(role, &content))?;
            }
            StreamEvent::Progress(message) => {
                if self.show_progress {
                    self.clear_line()?;
                    self.write(&format!("\r{}", Self::format_progress(&message)))?;
                }
            }
            StreamEvent::Error(message) => {
                if self.show_progress {
                    self.clear_line()?;
                }
                self.write_message(&Self::format_error(&message))?;
                error!("{}", message);
            }
            StreamEvent::Finished => {
                if self.show_progress {
                    self.clear_line()?;
                }
                io::stdout().flush()?;
                info!("Session finished");
            }
        }

        Ok(())
    }
}
