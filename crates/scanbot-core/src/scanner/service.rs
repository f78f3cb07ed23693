//! Scan service trait definition.

use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::model::ScanFunction;
use crate::error::Result;

/// A document body flowing from the scan backend towards a delivery target.
pub type DocumentStream = Pin<Box<dyn AsyncRead + Send>>;

/// The file a scan produced, as a stream plus the backend's file name.
pub struct ScannedDocument {
    pub stream: DocumentStream,
    pub file_name: String,
}

impl std::fmt::Debug for ScannedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannedDocument")
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

/// Wraps an in-memory buffer as a [`DocumentStream`].
pub fn stream_from_bytes(bytes: Vec<u8>) -> DocumentStream {
    Box::pin(std::io::Cursor::new(bytes))
}

/// Drains a [`DocumentStream`] into memory.
pub async fn read_document(mut stream: DocumentStream) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

/// Client for the scan backend.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Runs one scan of `function` on `device_id` and returns the produced file.
    ///
    /// Blocks for as long as the hardware takes; there is no cancellation.
    async fn scan(&self, function: &ScanFunction, device_id: &str) -> Result<ScannedDocument>;
}
