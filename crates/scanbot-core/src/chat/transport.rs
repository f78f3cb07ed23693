//! Chat transport ports.

use async_trait::async_trait;

use super::model::{ChatId, InboundEvent, Prompt, PromptHandle};
use crate::error::Result;
use crate::scanner::DocumentStream;

/// Outbound capabilities the session state machine needs from the chat
/// transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a new prompt with its option keyboard.
    async fn send_prompt(&self, chat_id: ChatId, prompt: &Prompt) -> Result<PromptHandle>;

    /// Replaces text and keyboard of an existing prompt.
    async fn edit_prompt(&self, chat_id: ChatId, handle: PromptHandle, prompt: &Prompt)
    -> Result<()>;

    async fn delete_prompt(&self, chat_id: ChatId, handle: PromptHandle) -> Result<()>;

    /// Attaches a file to the chat. The stream is consumed either way.
    async fn send_document(
        &self,
        chat_id: ChatId,
        document: DocumentStream,
        file_name: &str,
    ) -> Result<()>;

    /// Acknowledges a button press so the client stops its spinner.
    async fn acknowledge(&self, callback_id: &str, text: &str) -> Result<()>;
}

/// Ordered source of inbound events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Waits for the next batch of events; an empty batch means the wait timed out.
    async fn next_events(&self) -> Result<Vec<InboundEvent>>;
}
