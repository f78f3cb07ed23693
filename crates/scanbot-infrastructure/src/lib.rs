pub mod config_service;
pub mod paperless_client;
pub mod pdf_engine;
pub mod scan_client;

pub use crate::config_service::ConfigService;
pub use crate::paperless_client::PaperlessClient;
pub use crate::pdf_engine::LopdfPageEngine;
pub use crate::scan_client::HttpScanClient;
