//! One conversation with the sales assistant.
//!
//! Messages are append-only, except that a user turn whose assistant call fails
//! is taken back out so the history only ever holds completed exchanges.
//! `send` borrows the session mutably, so at most one question is in flight.

use log::error;

use crate::error::Result;
use crate::llm::{CompletionService, SalesAssistant};
use crate::schema::{ChatMessage, SalesRecord};

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Sends one question. Blank input is ignored and returns `Ok(None)`.
    ///
    /// On success the reply is appended after the user turn. On failure the
    /// user turn is removed again and the error is returned.
    pub async fn send<C: CompletionService>(
        &mut self,
        assistant: &SalesAssistant<C>,
        input: &str,
        records: &[SalesRecord],
        loaded_months: &[String],
    ) -> Result<Option<&ChatMessage>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        self.messages.push(ChatMessage::user(input));
        let outcome = assistant.ask(input, records, loaded_months).await;

        match outcome {
            Ok(reply) => {
                self.messages.push(ChatMessage::assistant(reply));
                Ok(self.messages.last())
            }
            Err(e) => {
                error!("Assistant turn failed: {}", e);
                self.messages.pop();
                Err(e)
            }
        }
    }
}
