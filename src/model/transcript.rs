use super::{Message, MessageRole};

/// Ordered, append-only history of one chat session.
///
/// The system instruction is not stored here; it is prepended when a
/// request is assembled.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn add_user_message(&mut self, content: String) -> &Message {
        self.append(Message::new(MessageRole::User, content))
    }

    pub fn add_assistant_message(&mut self, content: String) -> &Message {
        self.append(Message::new(MessageRole::Assistant, content))
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
