use std::path::PathBuf;

use serde::Serialize;

use super::ExtractionMethod;
use crate::error::DocsiftError;

/// Why an extraction attempt produced no usable text.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Unsupported,
    /// OCR would have been needed but the operator turned it off.
    OcrDisabled,
    DecodeFailed,
    /// Remote OCR failed, was cancelled, or returned nothing.
    OcrFailed,
    EmptyText,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported"),
            Self::OcrDisabled => write!(f, "ocr_disabled"),
            Self::DecodeFailed => write!(f, "decode_failed"),
            Self::OcrFailed => write!(f, "ocr_failed"),
            Self::EmptyText => write!(f, "empty_text"),
        }
    }
}

/// Outcome of one extraction attempt.
#[derive(Debug)]
pub struct ExtractionResult {
    pub text: Option<String>,
    pub method: ExtractionMethod,
    pub error: Option<DocsiftError>,
}

impl ExtractionResult {
    pub fn success(text: String, method: ExtractionMethod) -> Self {
        Self {
            text: Some(text),
            method,
            error: None,
        }
    }

    pub fn failed(method: ExtractionMethod, error: DocsiftError) -> Self {
        Self {
            text: None,
            method,
            error: Some(error),
        }
    }

    /// A configuration-driven failure that carries no error.
    pub fn soft_failure(method: ExtractionMethod) -> Self {
        Self {
            text: None,
            method,
            error: None,
        }
    }

    /// Non-empty text and no error.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        if self.is_success() {
            return None;
        }
        let reason = match self.method {
            ExtractionMethod::Unsupported => FailureReason::Unsupported,
            ExtractionMethod::OcrDisabled => FailureReason::OcrDisabled,
            _ if self.error.is_some() => FailureReason::DecodeFailed,
            ExtractionMethod::RemoteOcr => FailureReason::OcrFailed,
            _ => FailureReason::EmptyText,
        };
        Some(reason)
    }
}

/// An extraction result together with where it was cached, if it was.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    pub cache_location: Option<PathBuf>,
}
