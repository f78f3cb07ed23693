use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scanner::{Decision, ScanMode, ScanSource, ScanTarget};

/// Opaque conversation identifier assigned by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sender identifier, checked against the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a prompt already shown in a chat, used to edit or delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptHandle(pub i64);

/// One selectable option of a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Target(ScanTarget),
    Source(ScanSource),
    Mode(ScanMode),
    Decision(Decision),
}

impl Choice {
    /// Button label; also the payload the transport reports back on press.
    pub fn label(&self) -> &'static str {
        match self {
            Choice::Target(target) => target.as_str(),
            Choice::Source(source) => source.as_str(),
            Choice::Mode(mode) => mode.as_str(),
            Choice::Decision(decision) => decision.as_str(),
        }
    }
}

/// A message with an attached option keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub choices: Vec<Choice>,
}

impl Prompt {
    pub fn new(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            choices,
        }
    }

    pub fn yes_no(text: impl Into<String>) -> Self {
        Self::new(text, Decision::BOTH.into_iter().map(Choice::Decision).collect())
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.choices.iter().map(Choice::label).collect()
    }
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Free-text message
    Message { text: String },
    /// Button press on a prompt keyboard
    Callback { id: String, data: String },
}

/// A single inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn message(user_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id),
            chat_id: ChatId(chat_id),
            kind: EventKind::Message { text: text.into() },
        }
    }

    pub fn callback(
        user_id: i64,
        chat_id: i64,
        id: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            user_id: UserId(user_id),
            chat_id: ChatId(chat_id),
            kind: EventKind::Callback {
                id: id.into(),
                data: data.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_labels_follow_choice_order() {
        let prompt = Prompt::new(
            "Select a source",
            vec![
                Choice::Source(ScanSource::Adf),
                Choice::Source(ScanSource::Flatbed),
            ],
        );
        assert_eq!(prompt.labels(), vec!["ADF", "Flatbed"]);
    }

    #[test]
    fn test_yes_no_prompt() {
        assert_eq!(Prompt::yes_no("Duplex scan?").labels(), vec!["Yes", "No"]);
    }
}
