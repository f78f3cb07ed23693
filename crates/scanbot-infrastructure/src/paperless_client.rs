//! PaperlessClient - upload adapter for the document-management store.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use scanbot_core::delivery::DocumentStore;
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::scanner::DocumentStream;
use tokio_util::io::ReaderStream;

const POST_DOCUMENT_PATH: &str = "/api/documents/post_document/";
const DOCUMENT_FIELD: &str = "document";

/// Posts scanned documents to the store's ingestion endpoint.
#[derive(Clone)]
pub struct PaperlessClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl PaperlessClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for PaperlessClient {
    async fn upload(&self, document: DocumentStream, file_name: &str) -> Result<()> {
        let part = Part::stream(Body::wrap_stream(ReaderStream::new(document)))
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|err| ScanBotError::malformed(format!("Invalid MIME type: {err}")))?;
        let form = Form::new()
            .text("from_webui", "false")
            .part(DOCUMENT_FIELD, part);

        tracing::info!("[Paperless] Uploading {}", file_name);
        let response = self
            .client
            .post(format!("{}{}", self.endpoint, POST_DOCUMENT_PATH))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .multipart(form)
            .send()
            .await
            .map_err(|err| ScanBotError::unavailable(format!("Upload request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read upload response".to_string());

        if !status.is_success() {
            tracing::warn!("[Paperless] Upload of {} rejected ({}): {}", file_name, status, body);
            return Err(ScanBotError::fault(status.as_u16(), body));
        }

        tracing::info!("[Paperless] Upload of {} accepted: {}", file_name, body);
        Ok(())
    }
}
