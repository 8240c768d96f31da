use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::api::MistralOcrClient;
use super::postprocess::PostProcessingOptions;
use crate::config::OcrConfig;

/// Anything that can turn an image or scanned PDF into text.
///
/// Implementations collapse every failure to `None`.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(
        &self,
        path: &Path,
        options: &PostProcessingOptions,
        cancel: &CancellationToken,
    ) -> Option<String>;
}

#[derive(Clone)]
enum OcrBackend {
    Api { client: MistralOcrClient },
    Unavailable { reason: String },
}

#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let backend = match MistralOcrClient::new(config) {
            Ok(client) => {
                info!(model = %config.model, "Mistral OCR API backend initialized");
                OcrBackend::Api { client }
            }
            Err(e) => {
                let reason = format!("Mistral OCR backend unavailable: {e}");
                warn!("{}", reason);
                OcrBackend::Unavailable { reason }
            }
        };

        Self { backend }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub fn client(&self) -> Option<&MistralOcrClient> {
        match &self.backend {
            OcrBackend::Api { client } => Some(client),
            OcrBackend::Unavailable { .. } => None,
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrProvider {
    async fn recognize(
        &self,
        path: &Path,
        options: &PostProcessingOptions,
        cancel: &CancellationToken,
    ) -> Option<String> {
        match &self.backend {
            OcrBackend::Api { client } => client.recognize(path, options, cancel).await,
            OcrBackend::Unavailable { reason } => {
                warn!(path = %path.display(), "Skipping OCR: {}", reason);
                None
            }
        }
    }
}
