use rtf_parser::document::RtfDocument;

use crate::error::{DocsiftError, Result};

pub struct RtfExtractor;

impl RtfExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        // RTF is 7-bit with escapes; stray 8-bit bytes are tolerated.
        let source = String::from_utf8_lossy(bytes);
        if !source.trim_start().starts_with("{\\rtf") {
            return Err(DocsiftError::decode("RTF", "missing {\\rtf header"));
        }

        let document = RtfDocument::try_from(&*source)
            .map_err(|e| DocsiftError::decode("RTF", e.to_string()))?;
        Ok(document.get_text())
    }
}
