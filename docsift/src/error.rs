use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{format} decode error: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR job cancelled")]
    OcrCancelled,

    #[error("File too large for OCR: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Cache error: {0}")]
    Cache(String),
}

impl DocsiftError {
    pub fn decode(format: &'static str, message: impl Into<String>) -> Self {
        DocsiftError::Decode {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocsiftError>;
