//! Chat transport bindings for Scanbot.

pub mod telegram;

pub use telegram::TelegramClient;
