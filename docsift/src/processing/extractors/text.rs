use crate::error::{DocsiftError, Result};

pub struct TextExtractor;

impl TextExtractor {
    /// Strict UTF-8; a leading byte-order mark is dropped.
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| DocsiftError::decode("UTF-8", e.to_string()))
    }
}
