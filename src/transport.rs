//! The remote conversion service, seen from the client.
//!
//! The service is opaque: one `POST` per conversion with a multipart body
//! holding a single file field, answered by either a success status with the
//! converted document as the body, or a non-success status. No auth, no
//! custom headers.
//!
//! [`ConversionTransport`] is the seam; [`HttpTransport`] is the `reqwest`
//! implementation. The transport reports what happened on the wire; deciding
//! whether a status counts as success is the caller's job.

use crate::config::ClientConfig;
use crate::error::{DocSwapError, TransactionError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One upload: the original, unmodified file bytes under `field_name`.
#[derive(Clone)]
pub struct UploadRequest {
    pub url: Url,
    pub field_name: String,
    pub file_name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("url", &self.url.as_str())
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Status and body of the service's answer.
///
/// `body` is only read for success statuses; it is empty otherwise.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends an upload to the conversion service.
#[async_trait]
pub trait ConversionTransport: Send + Sync {
    /// Errors only for failures that produced no usable response (network,
    /// timeout, unreadable body).
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, TransactionError>;
}

/// [`ConversionTransport`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, DocSwapError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| DocSwapError::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn wire_error(&self, url: &Url, e: reqwest::Error) -> TransactionError {
        if e.is_timeout() {
            TransactionError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            TransactionError::Network {
                url: url.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ConversionTransport for HttpTransport {
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, TransactionError> {
        let part = Part::bytes(request.bytes.to_vec())
            .file_name(request.file_name.clone())
            .mime_str(&request.media_type)
            .map_err(|e| {
                TransactionError::InvalidRequest(format!(
                    "media type '{}': {}",
                    request.media_type, e
                ))
            })?;
        let form = Form::new().part(request.field_name.clone(), part);

        debug!(
            "POST {} ({} bytes as '{}')",
            request.url,
            request.bytes.len(),
            request.field_name
        );
        let response = self
            .client
            .post(request.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.wire_error(&request.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(UploadResponse {
                status: status.as_u16(),
                body: Vec::new(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                self.wire_error(&request.url, e)
            } else {
                TransactionError::BodyRead {
                    detail: e.to_string(),
                }
            }
        })?;
        debug!("HTTP {} with {} body bytes", status, body.len());

        Ok(UploadResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
