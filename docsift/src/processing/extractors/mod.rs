use std::path::Path;

use async_trait::async_trait;

use crate::config::LegacyConverterConfig;
use crate::error::{DocsiftError, Result};
use crate::models::DocumentKind;

pub mod docx;
pub mod legacy;
pub mod pdf;
pub mod rtf;
pub mod text;

pub use docx::DocxExtractor;
pub use legacy::LegacyDocExtractor;
pub use pdf::PdfExtractor;
pub use rtf::RtfExtractor;
pub use text::TextExtractor;

/// Local, format-specific text decoding.
#[async_trait]
pub trait DocumentDecoder: Send + Sync {
    /// Decodes `path` as `kind`. Kinds without a local decoder are an error.
    async fn decode(&self, kind: &DocumentKind, path: &Path) -> Result<String>;
}

/// The built-in decoders for every locally readable kind.
#[derive(Debug, Clone)]
pub struct StandardDecoders {
    legacy: LegacyDocExtractor,
}

impl StandardDecoders {
    pub fn new(legacy: &LegacyConverterConfig) -> Self {
        Self {
            legacy: LegacyDocExtractor::new(legacy),
        }
    }
}

impl Default for StandardDecoders {
    fn default() -> Self {
        Self::new(&LegacyConverterConfig::default())
    }
}

#[async_trait]
impl DocumentDecoder for StandardDecoders {
    async fn decode(&self, kind: &DocumentKind, path: &Path) -> Result<String> {
        match kind {
            DocumentKind::PlainText => TextExtractor::extract(&tokio::fs::read(path).await?),
            DocumentKind::Pdf => {
                let bytes = tokio::fs::read(path).await?;
                tokio::task::spawn_blocking(move || PdfExtractor::extract(&bytes))
                    .await
                    .map_err(|e| DocsiftError::decode("PDF", format!("decoder panicked: {e}")))?
            }
            DocumentKind::RichText => RtfExtractor::extract(&tokio::fs::read(path).await?),
            DocumentKind::WordDocument => DocxExtractor::extract(&tokio::fs::read(path).await?),
            DocumentKind::LegacyWord => self.legacy.extract(path).await,
            DocumentKind::Image => Err(DocsiftError::UnsupportedFormat(
                "images have no local decoder".to_string(),
            )),
            DocumentKind::Unknown(ext) => Err(DocsiftError::UnsupportedFormat(ext.clone())),
        }
    }
}
