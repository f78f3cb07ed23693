use scanbot_core::chat::ChatId;
use std::collections::HashMap;

use super::ChatSession;

/// Live chat sessions keyed by chat id.
///
/// Sessions are created on first contact and kept for the lifetime of the
/// registry. Events are handled one at a time, so no locking is needed.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<ChatId, ChatSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `chat_id`, creating it if this chat is new.
    pub fn get_or_create(&mut self, chat_id: ChatId) -> &mut ChatSession {
        self.sessions.entry(chat_id).or_insert_with(|| {
            tracing::info!("[SessionRegistry] New chat {}", chat_id);
            ChatSession::new(chat_id)
        })
    }

    pub fn get(&self, chat_id: ChatId) -> Option<&ChatSession> {
        self.sessions.get(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
