use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::postprocess::{PostProcessingOptions, PostProcessor};
use crate::config::{OcrConfig, DEFAULT_OCR_BASE_URL};
use crate::error::{DocsiftError, Result};

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OcrDocument {
    DocumentUrl { document_url: String },
    ImageUrl { image_url: String },
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: OcrDocument,
    include_image_base64: bool,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OcrPage {
    #[serde(default)]
    pub(crate) markdown: String,
}

/// One upload/resolve/recognize run against a single file.
#[derive(Debug)]
struct OcrJob<'a> {
    path: &'a Path,
    cancel: &'a CancellationToken,
}

impl<'a> OcrJob<'a> {
    fn new(path: &'a Path, cancel: &'a CancellationToken) -> Self {
        Self { path, cancel }
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(DocsiftError::OcrCancelled)
        } else {
            Ok(())
        }
    }
}

/// Joins per-page Markdown in page order under `Page {n}:` headers.
pub(crate) fn concatenate_pages(pages: &[OcrPage]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        let _ = write!(out, "Page {}:\n{}\n\n", i + 1, page.markdown);
    }
    out
}

fn is_pdf(path: &Path, head: &[u8]) -> bool {
    head.starts_with(b"%PDF")
        || path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Client for the Mistral document OCR API.
#[derive(Clone, Debug)]
pub struct MistralOcrClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_file_size: u64,
    url_expiry_hours: u32,
    resource_timeout: Duration,
}

impl MistralOcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| DocsiftError::Config("API key required for Mistral OCR".to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OCR_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocsiftError::Ocr(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model: config.model.clone(),
            max_file_size: config.max_file_size,
            url_expiry_hours: config.url_expiry_hours,
            resource_timeout: Duration::from_secs(config.resource_timeout_secs),
        })
    }

    /// Runs the full protocol and post-processes the output.
    ///
    /// Every failure (size limit, auth, non-200, malformed body, timeout,
    /// cancellation, empty output) is logged and collapsed to `None`.
    pub async fn recognize(
        &self,
        path: &Path,
        options: &PostProcessingOptions,
        cancel: &CancellationToken,
    ) -> Option<String> {
        let outcome = tokio::time::timeout(self.resource_timeout, self.run(path, cancel)).await;

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(DocsiftError::OcrCancelled)) => {
                info!(path = %path.display(), "OCR job cancelled");
                return None;
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "OCR failed");
                return None;
            }
            Err(_) => {
                warn!(
                    path = %path.display(),
                    "OCR timed out after {} seconds",
                    self.resource_timeout.as_secs()
                );
                return None;
            }
        };

        let text = PostProcessor::process(&raw, options);
        if text.is_empty() {
            warn!(path = %path.display(), "OCR produced no text after post-processing");
            return None;
        }
        Some(text)
    }

    /// Upload, resolve and recognize, returning the raw page concatenation.
    pub async fn run(&self, path: &Path, cancel: &CancellationToken) -> Result<String> {
        let job = OcrJob::new(path, cancel);

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_file_size {
            return Err(DocsiftError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        let bytes = tokio::fs::read(job.path).await?;
        let pdf = is_pdf(job.path, &bytes);

        job.checkpoint()?;
        let file_id = self.upload(&job, bytes).await?;
        job.checkpoint()?;
        debug!(file_id = %file_id, "Uploaded file for OCR");

        let url = self.signed_url(&job, &file_id).await?;
        job.checkpoint()?;
        debug!(file_id = %file_id, "Resolved signed URL");

        let document = if pdf {
            OcrDocument::DocumentUrl { document_url: url }
        } else {
            OcrDocument::ImageUrl { image_url: url }
        };
        let text = self.process(&job, document).await?;
        job.checkpoint()?;

        if text.is_empty() {
            return Err(DocsiftError::Ocr("OCR response contained no pages".to_string()));
        }
        Ok(text)
    }

    /// `GET /files/{id}`: true only when the service answers 200.
    pub async fn file_exists(&self, file_id: &str) -> bool {
        let url = format!("{}/files/{file_id}", self.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(e) => {
                warn!(file_id, error = %e, "File metadata request failed");
                false
            }
        }
    }

    async fn upload(&self, job: &OcrJob<'_>, bytes: Vec<u8>) -> Result<String> {
        let file_name = job
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let mime = mime_guess::from_path(job.path).first_or_octet_stream();

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .map_err(|e| DocsiftError::Ocr(format!("Invalid MIME type: {e}")))?;

        let form = multipart::Form::new()
            .text("purpose", "ocr")
            .part("file", file_part);

        let request = self
            .client
            .post(format!("{}/files", self.base_url))
            .multipart(form);

        let uploaded: UploadedFile = self.execute(job, request, "upload").await?;
        if uploaded.id.trim().is_empty() {
            return Err(DocsiftError::Ocr("Upload response missing file id".to_string()));
        }
        Ok(uploaded.id)
    }

    async fn signed_url(&self, job: &OcrJob<'_>, file_id: &str) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/files/{file_id}/url", self.base_url))
            .query(&[("expiry", self.url_expiry_hours)]);

        let signed: SignedUrl = self.execute(job, request, "signed url").await?;
        if signed.url.trim().is_empty() {
            return Err(DocsiftError::Ocr("Signed URL response missing url".to_string()));
        }
        Ok(signed.url)
    }

    async fn process(&self, job: &OcrJob<'_>, document: OcrDocument) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .json(&OcrRequest {
                model: &self.model,
                document,
                include_image_base64: false,
            });

        let response: OcrResponse = self.execute(job, request, "ocr").await?;
        debug!(pages = response.pages.len(), "OCR response received");
        Ok(concatenate_pages(&response.pages))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Sends one request, racing it against the job's cancellation token,
    /// and decodes a 200 response body.
    async fn execute<T: DeserializeOwned>(
        &self,
        job: &OcrJob<'_>,
        request: RequestBuilder,
        step: &'static str,
    ) -> Result<T> {
        let request = self.authorized(request);

        let response = tokio::select! {
            biased;
            _ = job.cancel.cancelled() => return Err(DocsiftError::OcrCancelled),
            response = request.send() => response.map_err(|e| {
                if e.is_timeout() {
                    DocsiftError::Ocr(format!("{step} request timed out"))
                } else {
                    DocsiftError::Ocr(format!("{step} request failed: {e}"))
                }
            })?,
        };

        let response = Self::check_status(response, step).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DocsiftError::Ocr(format!("Failed to parse {step} response: {e}")))
    }

    async fn check_status(response: Response, step: &str) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        Err(Self::map_http_error(status, step, &body))
    }

    fn map_http_error(status: StatusCode, step: &str, body: &str) -> DocsiftError {
        let message = match status.as_u16() {
            401 => format!("Authentication failed (401) during {step}: {body}"),
            422 => format!("Request rejected (422) during {step}: {body}"),
            429 => format!("Rate limit exceeded (429) during {step}: {body}"),
            520 => format!("Upstream error (520) during {step}: {body}"),
            _ => format!("OCR API error ({status}) during {step}: {body}"),
        };
        DocsiftError::Ocr(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_config() -> OcrConfig {
        OcrConfig {
            api_key: Some("test-key".to_string()),
            ..OcrConfig::default()
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = OcrConfig::default();
        let result = MistralOcrClient::new(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key required"));
    }

    #[test]
    fn test_default_base_url() {
        let client = MistralOcrClient::new(&create_test_config()).unwrap();
        assert_eq!(client.base_url, "https://api.mistral.ai/v1");
    }

    #[test]
    fn test_custom_base_url_drops_trailing_slash() {
        let mut config = create_test_config();
        config.base_url = Some("https://proxy.internal/v1/".to_string());
        let client = MistralOcrClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://proxy.internal/v1");
    }

    #[test]
    fn test_concatenate_pages_in_order() {
        let pages = vec![
            OcrPage {
                markdown: "# A".to_string(),
            },
            OcrPage {
                markdown: "# B".to_string(),
            },
        ];
        assert_eq!(
            concatenate_pages(&pages),
            "Page 1:\n# A\n\nPage 2:\n# B\n\n"
        );
        assert_eq!(concatenate_pages(&[]), "");
    }

    #[test]
    fn test_document_type_tagging() {
        let doc = OcrDocument::DocumentUrl {
            document_url: "https://signed/doc".to_string(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "document_url", "document_url": "https://signed/doc"})
        );

        let img = OcrDocument::ImageUrl {
            image_url: "https://signed/img".to_string(),
        };
        let value = serde_json::to_value(&img).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "image_url", "image_url": "https://signed/img"})
        );
    }

    #[test]
    fn test_is_pdf_by_extension_or_magic() {
        assert!(is_pdf(Path::new("a.PDF"), b""));
        assert!(is_pdf(Path::new("scan"), b"%PDF-1.7"));
        assert!(!is_pdf(Path::new("photo.png"), b"\x89PNG"));
    }

    #[test]
    fn test_map_http_error_mentions_status() {
        let err = MistralOcrClient::map_http_error(StatusCode::UNAUTHORIZED, "upload", "nope");
        assert!(err.to_string().contains("401"));
        let err = MistralOcrClient::map_http_error(StatusCode::BAD_GATEWAY, "ocr", "");
        assert!(err.to_string().contains("502"));
    }
}
