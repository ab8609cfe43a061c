use anyhow::{Context, Result, anyhow};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::models::{
    DocumentPayload, ExtractionResponse, ReportRequest, ReportResponse, UploadResponse,
};

const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Client for the document-processing service. Every call is a single attempt;
/// failures carry the raw response body.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

/// Result of `/extract-icd`: the payload as returned, plus the code items when
/// the payload has the expected shape.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub raw: Value,
    pub parsed: ExtractionResponse,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(anyhow!("service base url is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        let mime = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(OCTET_STREAM_MIME);
        let name = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("document")
            .to_string();
        info!("service: uploading {} ({}, {} bytes)", name, mime, bytes.len());
        let part = Part::bytes(bytes)
            .file_name(name)
            .mime_str(mime)
            .with_context(|| format!("invalid upload mime '{}'", mime))?;
        let form = Form::new().part("file", part);
        let request = self.request(Method::POST, "/upload").multipart(form);
        self.send_json(request, "/upload").await
    }

    pub async fn fetch_document(&self, doc_id: &str) -> Result<DocumentPayload> {
        let path = format!("/doc/{}", doc_id);
        self.send_json(self.request(Method::GET, &path), &path).await
    }

    pub async fn extract_codes(&self, doc_id: &str) -> Result<ExtractionResult> {
        let request = self
            .request(Method::POST, "/extract-icd")
            .json(&json!({ "doc_id": doc_id }));
        let raw: Value = self.send_json(request, "/extract-icd").await?;
        let parsed = serde_json::from_value(raw.clone()).unwrap_or_default();
        Ok(ExtractionResult { raw, parsed })
    }

    pub async fn view_report(
        &self,
        doc_id: &str,
        codes: Option<&[String]>,
    ) -> Result<ReportResponse> {
        let body = ReportRequest {
            doc_id,
            icd_codes: codes,
        };
        let request = self.request(Method::POST, "/view-report").json(&body);
        self.send_json(request, "/view-report").await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        label: &str,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("{} request failed", label))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read {} response", label))?;
        debug!("service: {} -> {} ({} bytes)", label, status, body.len());
        if !status.is_success() {
            return Err(anyhow!("{} failed ({}): {}", label, status, body));
        }
        let value: Value = serde_json::from_str(&body)
            .with_context(|| format!("{} returned invalid json: {}", label, body))?;
        if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
            return Err(anyhow!("{} failed: {}", label, error));
        }
        serde_json::from_value(value)
            .with_context(|| format!("unexpected {} response: {}", label, body))
    }
}
