//! Chat session services.
//!
//! One state machine per chat, the registry holding them, and the shared
//! collaborators every session calls into.

mod chat_session;
mod model;
mod registry;

pub use chat_session::{ChatSession, RESTART_COMMAND};
pub use model::{Phase, Selection};
pub use registry::SessionRegistry;

use scanbot_core::chat::ChatTransport;
use scanbot_core::scanner::{ScanService, ScannerCatalog};
use std::sync::Arc;

use crate::delivery::DeliveryDispatcher;
use crate::duplex::DuplexMerger;

/// Collaborators shared by all chat sessions.
pub struct SessionServices {
    pub catalog: ScannerCatalog,
    pub scanner: Arc<dyn ScanService>,
    pub merger: DuplexMerger,
    pub dispatcher: DeliveryDispatcher,
    pub transport: Arc<dyn ChatTransport>,
    /// Scanner device every scan is issued against.
    pub device_id: String,
}
