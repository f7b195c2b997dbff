use std::sync::Arc;

use rustyline::{DefaultEditor, error::ReadlineError};

use super::{controller::TurnController, factory::ClientFactory};
use crate::{
    AppResult,
    streaming::{self, OutputStreamer},
};

const TITLE: &str = "🤖 Helpdesk Chatbot";
const PROMPT: &str = "Stel je vraag... ";

/// Interactive session on the terminal. Returns on Ctrl-C or Ctrl-D.
pub async fn run(factory: Arc<ClientFactory>) -> AppResult<()> {
    let mut streamer = streaming::create_cli_streamer(true);
    let mut controller = TurnController::new(factory);
    let mut rl = DefaultEditor::new()?;

    streamer.write_message(TITLE)?;
    controller.render_transcript(&mut streamer).await?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;

                let outcome = controller.handle_input(&line, &mut streamer).await?;
                log::info!("Turn finished: {:?}", outcome);
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                log::error!("Readline error: {:?}", err);
                return Err(err.into());
            }
        }
    }

    streamer.finish().await?;
    log::info!(
        "Chat session ended after {} messages",
        controller.transcript().len()
    );

    Ok(())
}
