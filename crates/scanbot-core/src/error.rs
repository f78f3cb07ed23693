//! Error types for the Scanbot application.

use thiserror::Error;

/// A shared error type for the entire Scanbot workspace.
///
/// Scan client, page engine, delivery adapters and the chat transport all
/// report through this enum. The chat session state machine absorbs every
/// variant; nothing here is fatal to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanBotError {
    /// Network/transport failure talking to the scan backend or document store
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Non-success HTTP status other than the recoverable internal-error case
    #[error("Backend fault: HTTP {status} - {message}")]
    BackendFault { status: u16, message: String },

    /// The invalidate/reload/retry recovery protocol itself failed
    #[error("Backend recovery failed: {0}")]
    BackendRecoveryFailed(String),

    /// Undecodable backend payload
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Duplex front/rear page counts differ, or a side could not be split
    #[error("Page count mismatch: front has {front} page(s), rear has {rear} page(s)")]
    PageCountMismatch { front: usize, rear: usize },

    /// Low-level page split/merge primitive failed
    #[error("Page engine error: {0}")]
    PageEngine(String),

    /// Delivery target not recognized or not configured
    #[error("Unknown delivery target: {0}")]
    UnknownTarget(String),

    /// Sender is not on the allow-list
    #[error("Unauthorized user: {0}")]
    UnauthorizedUser(i64),

    /// A button payload that does not name a valid option
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// Chat transport failure (send/edit/delete/attach)
    #[error("Chat transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error
    #[error("IO error: {message}")]
    Io { message: String },
}

impl ScanBotError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a BackendUnavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Creates a BackendFault error
    pub fn fault(status: u16, message: impl Into<String>) -> Self {
        Self::BackendFault {
            status,
            message: message.into(),
        }
    }

    /// Creates a BackendRecoveryFailed error
    pub fn recovery_failed(message: impl Into<String>) -> Self {
        Self::BackendRecoveryFailed(message.into())
    }

    /// Creates a MalformedResponse error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Creates a PageEngine error
    pub fn page_engine(message: impl Into<String>) -> Self {
        Self::PageEngine(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a BackendRecoveryFailed error
    pub fn is_recovery_failed(&self) -> bool {
        matches!(self, Self::BackendRecoveryFailed(_))
    }

    /// Check if this is a BackendFault error
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::BackendFault { .. })
    }

    /// Check if this is a PageCountMismatch error
    pub fn is_page_count_mismatch(&self) -> bool {
        matches!(self, Self::PageCountMismatch { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ScanBotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ScanBotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ScanBotError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ScanBotError>`.
pub type Result<T> = std::result::Result<T, ScanBotError>;
