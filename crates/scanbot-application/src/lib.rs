//! Application layer for Scanbot.
//!
//! Coordinates the domain ports into the chat-driven scan workflow: session
//! state machines, duplex reassembly, delivery routing and event dispatch.

pub mod bot;
pub mod delivery;
pub mod duplex;
pub mod session;

pub use bot::ScanBot;
pub use delivery::DeliveryDispatcher;
pub use duplex::DuplexMerger;
pub use session::{ChatSession, Phase, SessionRegistry, SessionServices};
