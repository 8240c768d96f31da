use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::extractors::DocumentDecoder;
use crate::config::ExtractionSettings;
use crate::error::DocsiftError;
use crate::models::{DocumentKind, ExtractionMethod, ExtractionResult, SourceFile};
use crate::ocr::TextRecognizer;

const SNIFF_LEN: usize = 8192;

/// Picks an extraction strategy per file and runs it.
#[derive(Clone)]
pub struct FormatDispatcher {
    decoder: Arc<dyn DocumentDecoder>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl FormatDispatcher {
    pub fn new(decoder: Arc<dyn DocumentDecoder>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            decoder,
            recognizer,
        }
    }

    /// Extension first; files without one are classified by content.
    pub async fn classify(&self, source: &SourceFile) -> DocumentKind {
        match source.extension() {
            Some(ext) => DocumentKind::from_extension(&ext),
            None => sniff(&source.path).await,
        }
    }

    /// Never fails: every outcome, including unknown input, is a result.
    pub async fn extract(
        &self,
        source: &SourceFile,
        settings: &ExtractionSettings,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        if source.is_directory {
            return ExtractionResult::failed(
                ExtractionMethod::Unsupported,
                DocsiftError::UnsupportedFormat(format!(
                    "{} is a directory",
                    source.path.display()
                )),
            );
        }

        let kind = self.classify(source).await;
        debug!(path = %source.path.display(), ?kind, "Dispatching extraction");

        let method = match &kind {
            DocumentKind::PlainText => ExtractionMethod::PlainText,
            DocumentKind::RichText => ExtractionMethod::RichText,
            DocumentKind::WordDocument | DocumentKind::LegacyWord => {
                ExtractionMethod::LegacyDocument
            }
            DocumentKind::Pdf => return self.extract_pdf(source, settings, cancel).await,
            DocumentKind::Image => return self.recognize(source, settings, cancel).await,
            DocumentKind::Unknown(ext) => {
                let detail = if ext.is_empty() {
                    format!("unrecognized content in {}", source.name)
                } else {
                    format!(".{ext}")
                };
                return ExtractionResult::failed(
                    ExtractionMethod::Unsupported,
                    DocsiftError::UnsupportedFormat(detail),
                );
            }
        };
        self.decode_local(&kind, source, method).await
    }

    async fn extract_pdf(
        &self,
        source: &SourceFile,
        settings: &ExtractionSettings,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        match self.decoder.decode(&DocumentKind::Pdf, &source.path).await {
            Ok(text) if !text.trim().is_empty() => {
                ExtractionResult::success(text, ExtractionMethod::PdfTextLayer)
            }
            Ok(_) => {
                debug!(path = %source.path.display(), "PDF has no text layer");
                self.recognize(source, settings, cancel).await
            }
            Err(e) if settings.auto_apply_ocr => {
                warn!(
                    path = %source.path.display(),
                    error = %e,
                    "PDF text layer unreadable, trying OCR"
                );
                self.recognize(source, settings, cancel).await
            }
            Err(e) => ExtractionResult::failed(ExtractionMethod::PdfTextLayer, e),
        }
    }

    async fn recognize(
        &self,
        source: &SourceFile,
        settings: &ExtractionSettings,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        if !settings.auto_apply_ocr {
            info!(path = %source.path.display(), "OCR needed but disabled");
            return ExtractionResult::soft_failure(ExtractionMethod::OcrDisabled);
        }

        match self
            .recognizer
            .recognize(&source.path, &settings.post_processing, cancel)
            .await
        {
            Some(text) => ExtractionResult::success(text, ExtractionMethod::RemoteOcr),
            None => ExtractionResult::soft_failure(ExtractionMethod::RemoteOcr),
        }
    }

    async fn decode_local(
        &self,
        kind: &DocumentKind,
        source: &SourceFile,
        method: ExtractionMethod,
    ) -> ExtractionResult {
        match self.decoder.decode(kind, &source.path).await {
            Ok(text) => ExtractionResult::success(text, method),
            Err(e) => {
                warn!(path = %source.path.display(), error = %e, "Local decode failed");
                ExtractionResult::failed(method, e)
            }
        }
    }
}

/// Classifies by magic bytes, falling back to UTF-8 text detection.
async fn sniff(path: &Path) -> DocumentKind {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    let read = match tokio::fs::File::open(path).await {
        Ok(file) => file.take(SNIFF_LEN as u64).read_to_end(&mut head).await,
        Err(e) => Err(e),
    };
    if let Err(e) = read {
        debug!(path = %path.display(), error = %e, "Could not read file for sniffing");
        return DocumentKind::Unknown(String::new());
    }

    if let Some(kind) = infer::get(&head) {
        return DocumentKind::from_extension(kind.extension());
    }

    let looks_textual = !head.contains(&0)
        && match std::str::from_utf8(&head) {
            Ok(_) => true,
            // Truncated mid-character at the sniff boundary.
            Err(e) => e.error_len().is_none(),
        };
    if looks_textual && !head.is_empty() {
        DocumentKind::PlainText
    } else {
        DocumentKind::Unknown(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureReason;
    use crate::ocr::PostProcessingOptions;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedDecoder {
        /// `None` makes the PDF decoder fail.
        pdf_text: Option<String>,
    }

    #[async_trait]
    impl DocumentDecoder for FixedDecoder {
        async fn decode(&self, kind: &DocumentKind, path: &Path) -> crate::error::Result<String> {
            match kind {
                DocumentKind::Pdf => self
                    .pdf_text
                    .clone()
                    .ok_or_else(|| DocsiftError::decode("PDF", "broken xref table")),
                DocumentKind::PlainText => {
                    crate::processing::extractors::TextExtractor::extract(&std::fs::read(path)?)
                }
                _ => Err(DocsiftError::decode("TEST", "not handled")),
            }
        }
    }

    #[derive(Default)]
    struct CountingRecognizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextRecognizer for CountingRecognizer {
        async fn recognize(
            &self,
            _path: &Path,
            _options: &PostProcessingOptions,
            _cancel: &CancellationToken,
        ) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some("recognized".to_string())
        }
    }

    fn dispatcher_with(pdf_text: Option<&str>) -> (FormatDispatcher, Arc<CountingRecognizer>) {
        let recognizer = Arc::new(CountingRecognizer::default());
        let dispatcher = FormatDispatcher::new(
            Arc::new(FixedDecoder {
                pdf_text: pdf_text.map(str::to_string),
            }),
            recognizer.clone(),
        );
        (dispatcher, recognizer)
    }

    fn dispatcher(pdf_text: &str) -> (FormatDispatcher, Arc<CountingRecognizer>) {
        dispatcher_with(Some(pdf_text))
    }

    fn settings(auto_apply_ocr: bool) -> ExtractionSettings {
        ExtractionSettings {
            auto_apply_ocr,
            ..ExtractionSettings::default()
        }
    }

    fn source(dir: &Path, name: &str, bytes: &[u8]) -> SourceFile {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        SourceFile::new(path, bytes.len() as u64, Utc::now())
    }

    #[tokio::test]
    async fn test_pdf_with_text_layer_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recognizer) = dispatcher("embedded words");
        let src = source(dir.path(), "doc.pdf", b"%PDF-1.4");

        let result = dispatcher
            .extract(&src, &settings(true), &CancellationToken::new())
            .await;
        assert!(result.is_success());
        assert_eq!(result.method, ExtractionMethod::PdfTextLayer);
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_pdf_falls_through_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recognizer) = dispatcher(" \n\n ");
        let src = source(dir.path(), "scan.pdf", b"%PDF-1.4");

        let result = dispatcher
            .extract(&src, &settings(true), &CancellationToken::new())
            .await;
        assert_eq!(result.method, ExtractionMethod::RemoteOcr);
        assert_eq!(result.text.as_deref(), Some("recognized"));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_falls_through_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recognizer) = dispatcher_with(None);
        let src = source(dir.path(), "damaged.pdf", b"%PDF-1.4 truncated");

        let result = dispatcher
            .extract(&src, &settings(true), &CancellationToken::new())
            .await;
        assert_eq!(result.method, ExtractionMethod::RemoteOcr);
        assert_eq!(result.text.as_deref(), Some("recognized"));
        assert!(result.error.is_none());
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_without_ocr_surfaces_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recognizer) = dispatcher_with(None);
        let src = source(dir.path(), "damaged.pdf", b"%PDF-1.4 truncated");

        let result = dispatcher
            .extract(&src, &settings(false), &CancellationToken::new())
            .await;
        assert_eq!(result.method, ExtractionMethod::PdfTextLayer);
        assert!(matches!(
            result.error,
            Some(DocsiftError::Decode { format: "PDF", .. })
        ));
        assert_eq!(result.failure_reason(), Some(FailureReason::DecodeFailed));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ocr_disabled_is_soft_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recognizer) = dispatcher("");
        let pdf = source(dir.path(), "scan.pdf", b"%PDF-1.4");
        let png = source(dir.path(), "photo.png", b"\x89PNG\r\n\x1a\n");

        for src in [pdf, png] {
            let result = dispatcher
                .extract(&src, &settings(false), &CancellationToken::new())
                .await;
            assert_eq!(result.method, ExtractionMethod::OcrDisabled);
            assert!(result.error.is_none());
            assert!(result.text.is_none());
        }
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plain_text_success_iff_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = dispatcher("");

        let good = source(dir.path(), "good.md", "# title".as_bytes());
        let result = dispatcher
            .extract(&good, &settings(true), &CancellationToken::new())
            .await;
        assert!(result.is_success());
        assert_eq!(result.method, ExtractionMethod::PlainText);

        let bad = source(dir.path(), "bad.txt", &[0xC3, 0x28]);
        let result = dispatcher
            .extract(&bad, &settings(true), &CancellationToken::new())
            .await;
        assert!(!result.is_success());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recognizer) = dispatcher("");
        let src = source(dir.path(), "archive.xyz", b"\x00\x01");

        let result = dispatcher
            .extract(&src, &settings(true), &CancellationToken::new())
            .await;
        assert_eq!(result.method, ExtractionMethod::Unsupported);
        assert!(result.error.unwrap().to_string().contains(".xyz"));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = dispatcher("");
        let mut src = SourceFile::new(dir.path(), 0, Utc::now());
        src.is_directory = true;

        let result = dispatcher
            .extract(&src, &settings(true), &CancellationToken::new())
            .await;
        assert_eq!(result.method, ExtractionMethod::Unsupported);
    }

    #[tokio::test]
    async fn test_sniffing_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = dispatcher("");

        let png = source(dir.path(), "scan", b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR");
        assert_eq!(dispatcher.classify(&png).await, DocumentKind::Image);

        let pdf = source(dir.path(), "statement", b"%PDF-1.7\n%\xE2\xE3\xCF\xD3");
        assert_eq!(dispatcher.classify(&pdf).await, DocumentKind::Pdf);

        let text = source(dir.path(), "README", b"just some words");
        assert_eq!(dispatcher.classify(&text).await, DocumentKind::PlainText);

        let binary = source(dir.path(), "blob", &[0x00, 0x9F, 0x92, 0x96]);
        assert!(matches!(
            dispatcher.classify(&binary).await,
            DocumentKind::Unknown(_)
        ));
    }
}
