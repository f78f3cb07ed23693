//! Chat transport domain module.
//!
//! Identifiers, prompts and inbound events exchanged with whatever messaging
//! protocol carries the conversation, plus the `ChatTransport` and
//! `EventSource` ports.

mod model;
mod transport;

pub use model::{ChatId, Choice, EventKind, InboundEvent, Prompt, PromptHandle, UserId};
pub use transport::{ChatTransport, EventSource};
