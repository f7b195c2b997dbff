use std::sync::Arc;

use super::factory::ClientFactory;
use crate::{
    AppResult,
    model::{Message, Transcript},
    streaming::{OutputStreamer, StreamEvent},
};

pub const SYSTEM_INSTRUCTION: &str = "Je bent een behulpzame helpdesk assistent. Beantwoord vragen kort en duidelijk in het Nederlands.";

const CLIENT_UNAVAILABLE: &str = "OpenAI client not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered(String),
    ClientUnavailable,
    Failed(String),
}

/// Places the system instruction ahead of the whole transcript.
pub fn assemble_request(system_instruction: &str, transcript: &[Message]) -> Vec<Message> {
    std::iter::once(Message::system(system_instruction))
        .chain(transcript.iter().cloned())
        .collect()
}

/// Drives one chat session turn by turn and owns its transcript.
pub struct TurnController {
    factory: Arc<ClientFactory>,
    transcript: Transcript,
    state: TurnState,
}

impl TurnController {
    pub fn new(factory: Arc<ClientFactory>) -> Self {
        Self {
            factory,
            transcript: Transcript::new(),
            state: TurnState::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub async fn render_transcript(&self, streamer: &mut dyn OutputStreamer) -> AppResult<()> {
        for message in self.transcript.all() {
            streamer
                .handle_event(StreamEvent::Message {
                    role: message.role,
                    content: message.content.clone(),
                })
                .await?;
        }
        Ok(())
    }

    /// Runs one turn. Request failures are shown on `streamer` and reported
    /// in the outcome; only display errors come back as `Err`.
    pub async fn handle_input(
        &mut self,
        input: &str,
        streamer: &mut dyn OutputStreamer,
    ) -> AppResult<TurnOutcome> {
        let user = self.transcript.add_user_message(input.to_string()).clone();
        streamer
            .handle_event(StreamEvent::Message {
                role: user.role,
                content: user.content,
            })
            .await?;

        self.state = TurnState::AwaitingReply;
        let outcome = self.request_reply(streamer).await;
        self.state = TurnState::Idle;

        let outcome = outcome?;
        match &outcome {
            TurnOutcome::Answered(reply) => {
                let assistant = self.transcript.add_assistant_message(reply.clone()).clone();
                streamer
                    .handle_event(StreamEvent::Message {
                        role: assistant.role,
                        content: assistant.content,
                    })
                    .await?;
            }
            TurnOutcome::ClientUnavailable => {
                streamer
                    .handle_event(StreamEvent::Error(CLIENT_UNAVAILABLE.to_string()))
                    .await?;
            }
            TurnOutcome::Failed(message) => {
                streamer
                    .handle_event(StreamEvent::Error(message.clone()))
                    .await?;
            }
        }

        log::debug!("Transcript holds {} messages", self.transcript.len());
        Ok(outcome)
    }

    async fn request_reply(&self, streamer: &mut dyn OutputStreamer) -> AppResult<TurnOutcome> {
        let Some(client) = self.factory.get_client(streamer).await? else {
            log::warn!("{}", CLIENT_UNAVAILABLE);
            return Ok(TurnOutcome::ClientUnavailable);
        };

        let messages = assemble_request(SYSTEM_INSTRUCTION, self.transcript.all());
        match client.complete(&messages, streamer).await {
            Ok(reply) => Ok(TurnOutcome::Answered(reply)),
            Err(e) => {
                let e = e.into_completion_request();
                log::error!("{}", e);
                Ok(TurnOutcome::Failed(e.to_string()))
            }
        }
    }
}
