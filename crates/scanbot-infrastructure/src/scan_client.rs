//! HttpScanClient - REST client for the scan backend.
//!
//! Submits a scan job, recovers once from an internal-error fault by
//! invalidating and reloading the backend's scanner context, then streams the
//! produced file back.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, Response, StatusCode, Url};
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::scanner::{ScanFunction, ScanService, ScannedDocument};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::io::StreamReader;

const SCAN_PATH: &str = "/api/v1/scan";
const CONTEXT_PATH: &str = "/api/v1/context";
const FILES_PATH: &str = "/api/v1/files";

// Single fixed paper profile (A4 portrait, 200 dpi).
const PAGE_WIDTH: u32 = 215;
const PAGE_HEIGHT: u32 = 297;
const RESOLUTION: u32 = 200;
const PIPELINE: &str = "PDF (TIF | @:pipeline.uncompressed)";

/// Scan backend client implementing the recovery-retry protocol.
#[derive(Clone)]
pub struct HttpScanClient {
    client: Client,
    endpoint: String,
}

impl HttpScanClient {
    /// Creates a client whose requests time out after `scan_timeout`.
    pub fn new(endpoint: impl Into<String>, scan_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(scan_timeout)
            .build()
            .map_err(|err| ScanBotError::config(format!("Failed to build scan client: {err}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn submit(&self, request: &ScanRequest) -> Result<Response> {
        self.client
            .post(self.url(SCAN_PATH))
            .json(request)
            .send()
            .await
            .map_err(|err| ScanBotError::unavailable(format!("Scan request failed: {err}")))
    }

    /// Invalidate context, reload context, retry the scan exactly once.
    async fn recover(&self, request: &ScanRequest) -> Result<Response> {
        tracing::warn!("[ScanClient] Backend reported an internal error, reloading scanners");

        tracing::debug!("[ScanClient] Deleting scanner context");
        let deleted = self
            .client
            .delete(self.url(CONTEXT_PATH))
            .send()
            .await
            .map_err(|err| {
                ScanBotError::recovery_failed(format!("Could not delete scanners: {err}"))
            })?;
        if !deleted.status().is_success() {
            return Err(ScanBotError::recovery_failed(format!(
                "Failed to delete scanners: {}",
                deleted.status()
            )));
        }

        tracing::debug!("[ScanClient] Reloading scanner context");
        let reloaded = self
            .client
            .get(self.url(CONTEXT_PATH))
            .send()
            .await
            .map_err(|err| {
                ScanBotError::recovery_failed(format!("Failed to reload scanners: {err}"))
            })?;
        if !reloaded.status().is_success() {
            return Err(ScanBotError::recovery_failed(format!(
                "Could not reload scanners: {}",
                reloaded.status()
            )));
        }

        tracing::info!("[ScanClient] Retrying scan after context reload");
        let retried = self.submit(request).await.map_err(|err| {
            ScanBotError::recovery_failed(format!("Retried scan failed: {err}"))
        })?;
        if !retried.status().is_success() {
            return Err(ScanBotError::recovery_failed(format!(
                "Retried scan failed with status {}",
                retried.status()
            )));
        }

        Ok(retried)
    }

    /// Download URL for `file_name`, escaped as a single path segment.
    fn file_url(&self, file_name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(FILES_PATH))
            .map_err(|err| ScanBotError::config(format!("Invalid scan backend URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ScanBotError::config("Scan backend URL cannot carry a path"))?
            .push(file_name);
        Ok(url)
    }

    async fn fetch_file(&self, file_name: &str) -> Result<ScannedDocument> {
        tracing::debug!("[ScanClient] Fetching scanned file {}", file_name);
        let response = self
            .client
            .get(self.file_url(file_name)?)
            .send()
            .await
            .map_err(|err| ScanBotError::unavailable(format!("File download failed: {err}")))?;

        if !response.status().is_success() {
            return Err(map_http_error(response).await);
        }

        let body = response.bytes_stream().map_err(std::io::Error::other);

        Ok(ScannedDocument {
            stream: Box::pin(StreamReader::new(body)),
            file_name: file_name.to_string(),
        })
    }
}

#[async_trait]
impl ScanService for HttpScanClient {
    async fn scan(&self, function: &ScanFunction, device_id: &str) -> Result<ScannedDocument> {
        tracing::info!("[ScanClient] Starting scan {} on {}", function, device_id);
        let request = ScanRequest::new(function, device_id);

        let response = self.submit(&request).await?;
        let response = match response.status() {
            StatusCode::INTERNAL_SERVER_ERROR => self.recover(&request).await?,
            status if status.is_success() => response,
            _ => return Err(map_http_error(response).await),
        };

        let body = response
            .bytes()
            .await
            .map_err(|err| ScanBotError::unavailable(format!("Failed to read scan response: {err}")))?;
        let parsed: ScanResponse = serde_json::from_slice(&body)
            .map_err(|err| ScanBotError::malformed(format!("Failed to parse scan response: {err}")))?;

        tracing::info!("[ScanClient] Scan produced {}", parsed.file.name);
        self.fetch_file(&parsed.file.name).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanParams {
    device_id: String,
    top: u32,
    left: u32,
    width: u32,
    height: u32,
    page_width: u32,
    page_height: u32,
    resolution: u32,
    mode: String,
    source: String,
    adf_mode: String,
    brightness: i32,
    contrast: i32,
    dynamic_lineart: bool,
    ald: String,
}

#[derive(Debug, Serialize)]
struct ScanRequest {
    params: ScanParams,
    filters: Vec<String>,
    pipeline: String,
    batch: String,
    index: u32,
}

impl ScanRequest {
    fn new(function: &ScanFunction, device_id: &str) -> Self {
        Self {
            params: ScanParams {
                device_id: device_id.to_string(),
                top: 0,
                left: 0,
                width: PAGE_WIDTH,
                height: PAGE_HEIGHT,
                page_width: PAGE_WIDTH,
                page_height: PAGE_HEIGHT,
                resolution: RESOLUTION,
                mode: function.mode.as_str().to_string(),
                source: function.source.as_str().to_string(),
                adf_mode: "Simplex".to_string(),
                brightness: 0,
                contrast: 0,
                dynamic_lineart: false,
                ald: "yes".to_string(),
            },
            filters: Vec::new(),
            pipeline: PIPELINE.to_string(),
            batch: function.source.batch_mode().to_string(),
            index: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    file: ScannedFile,
}

#[derive(Debug, Deserialize)]
struct ScannedFile {
    name: String,
}

async fn map_http_error(response: Response) -> ScanBotError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    tracing::warn!("[ScanClient] Backend returned {}: {}", status, body);
    ScanBotError::fault(status.as_u16(), body)
}
