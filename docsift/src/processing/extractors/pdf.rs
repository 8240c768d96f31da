use crate::error::{DocsiftError, Result};

pub struct PdfExtractor;

impl PdfExtractor {
    /// Reads the embedded text layer. Scanned PDFs yield empty or
    /// whitespace-only text.
    pub fn extract(bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocsiftError::decode("PDF", e.to_string()))
    }
}
