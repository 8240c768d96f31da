use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExtractionMethod, SourceFile};

/// Persisted result of a successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub extracted_text: String,
    pub extraction_date: DateTime<Utc>,
    /// Source modification time as observed when the text was extracted.
    pub original_file_modification_date: DateTime<Utc>,
    pub original_file_path: PathBuf,
    pub extraction_method: ExtractionMethod,
}

impl CacheRecord {
    pub fn new(text: &str, source: &SourceFile, method: ExtractionMethod) -> Self {
        Self {
            extracted_text: text.to_string(),
            extraction_date: Utc::now(),
            original_file_modification_date: source.modified,
            original_file_path: source.path.clone(),
            extraction_method: method,
        }
    }

    /// A record is usable only while the source's modification time is
    /// exactly the one it was extracted from.
    pub fn is_valid_for(&self, source: &SourceFile) -> bool {
        self.original_file_modification_date == source.modified
    }
}
