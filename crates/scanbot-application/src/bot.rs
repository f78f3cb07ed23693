//! Event dispatch for the scan bot.
//!
//! Pulls events off a single ordered source and feeds them, one at a time,
//! to the session of the chat they belong to.

use scanbot_core::chat::{ChatId, EventKind, EventSource, InboundEvent, UserId};
use scanbot_core::error::{Result, ScanBotError};
use std::collections::HashSet;
use std::time::Duration;

use crate::session::{ChatSession, SessionRegistry, SessionServices};

/// Pause before polling again after the event source failed.
pub const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct ScanBot {
    allowed_users: HashSet<UserId>,
    registry: SessionRegistry,
    services: SessionServices,
}

impl ScanBot {
    pub fn new(allowed_users: impl IntoIterator<Item = i64>, services: SessionServices) -> Self {
        Self {
            allowed_users: allowed_users.into_iter().map(UserId).collect(),
            registry: SessionRegistry::new(),
            services,
        }
    }

    pub fn services(&self) -> &SessionServices {
        &self.services
    }

    pub fn session(&self, chat_id: ChatId) -> Option<&ChatSession> {
        self.registry.get(chat_id)
    }

    pub fn authorize(&self, user_id: UserId) -> Result<()> {
        if self.allowed_users.contains(&user_id) {
            Ok(())
        } else {
            Err(ScanBotError::UnauthorizedUser(user_id.0))
        }
    }

    /// Handles one inbound event. Events from users outside the allow-list
    /// are dropped without any reply.
    pub async fn handle(&mut self, event: InboundEvent) {
        if let Err(err) = self.authorize(event.user_id) {
            tracing::debug!("[ScanBot] Dropping event from chat {}: {}", event.chat_id, err);
            return;
        }

        let session = self.registry.get_or_create(event.chat_id);
        match event.kind {
            EventKind::Message { text } => session.handle_message(&text, &self.services).await,
            EventKind::Callback { id, data } => {
                session.handle_callback(&data, &self.services).await;
                if let Err(err) = self.services.transport.acknowledge(&id, &data).await {
                    tracing::warn!("[ScanBot] Failed to acknowledge callback {}: {}", id, err);
                }
            }
        }
    }

    /// Processes events from `source` until the surrounding task is cancelled.
    pub async fn run(&mut self, source: &dyn EventSource) {
        tracing::info!(
            "[ScanBot] Listening for events from {} allowed user(s)",
            self.allowed_users.len()
        );

        loop {
            match source.next_events().await {
                Ok(events) => {
                    for event in events {
                        self.handle(event).await;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        "[ScanBot] Polling failed, retrying in {:?}: {}",
                        POLL_RETRY_DELAY,
                        err
                    );
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }
}
