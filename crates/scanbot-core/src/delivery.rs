//! Document-store delivery port.

use async_trait::async_trait;

use crate::error::Result;
use crate::scanner::DocumentStream;

/// Upload endpoint of a document-management system.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Uploads `document` under `file_name`. The stream is consumed either way.
    async fn upload(&self, document: DocumentStream, file_name: &str) -> Result<()>;
}
