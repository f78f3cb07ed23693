pub mod chat;
pub mod config;
pub mod delivery;
pub mod error;
pub mod pages;
pub mod scanner;

// Re-export common error type
pub use error::ScanBotError;
