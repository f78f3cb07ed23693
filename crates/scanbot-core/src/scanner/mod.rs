//! Scanner domain module.
//!
//! - `model`: source/mode/target enumerations and `ScanFunction`
//! - `catalog`: the static `ScannerCatalog` used to build each selection step
//! - `service`: the `ScanService` port implemented by the HTTP scan client

pub mod catalog;
pub mod model;
pub mod service;

pub use catalog::ScannerCatalog;
pub use model::{Decision, ScanConfig, ScanFunction, ScanMode, ScanSource, ScanTarget};
pub use service::{DocumentStream, ScanService, ScannedDocument, read_document, stream_from_bytes};
