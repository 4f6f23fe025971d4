//! Remote document-OCR service backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::OcrError;
use crate::models::bulletin::BulletinImage;
use crate::models::config::OcrConfig;

use super::{OcrBackend, OcrOutcome};

/// OCR backend posting the image to a hosted document-OCR service.
///
/// Expects a JSON reply shaped `{"text": "..."}`. Endpoint and API key
/// come from configuration; without an endpoint this backend fails fast
/// and the chain advances.
pub struct DocumentOcrBackend {
    endpoint: Option<String>,
    api_key: Option<String>,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ServiceReply {
    text: String,
}

impl DocumentOcrBackend {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Service(format!("http client: {e}")))?;

        Ok(Self {
            endpoint: config.service_url.clone(),
            api_key: config.service_key.clone(),
            http,
        })
    }
}

#[async_trait]
impl OcrBackend for DocumentOcrBackend {
    fn name(&self) -> &'static str {
        "cloud"
    }

    async fn extract(&self, image: &BulletinImage) -> Result<OcrOutcome, OcrError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| OcrError::NotConfigured("no OCR service endpoint".to_string()))?;

        let mut request = self
            .http
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(image.bytes.clone());

        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| OcrError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Service(format!(
                "service answered {status} for {endpoint}"
            )));
        }

        let reply: ServiceReply = response
            .json()
            .await
            .map_err(|e| OcrError::Service(format!("malformed reply: {e}")))?;

        debug!(chars = reply.text.len(), "document-OCR service replied");

        if reply.text.trim().is_empty() {
            return Err(OcrError::EmptyOutput);
        }

        Ok(OcrOutcome::Text(reply.text))
    }
}
