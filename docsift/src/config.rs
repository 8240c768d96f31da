use std::env;

use crate::ocr::{ImageHandling, PostProcessingOptions};

pub const DEFAULT_OCR_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";

/// Largest file the OCR service accepts, in bytes.
pub const MAX_OCR_FILE_SIZE: u64 = 50_000_000;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Parse `OCR_IMAGE_HANDLING` (`keep`, `strip` or `placeholder`).
/// The placeholder text comes from `OCR_IMAGE_PLACEHOLDER`.
fn parse_image_handling() -> ImageHandling {
    let placeholder = env::var("OCR_IMAGE_PLACEHOLDER")
        .unwrap_or_else(|_| ImageHandling::DEFAULT_PLACEHOLDER.to_string());

    match env::var("OCR_IMAGE_HANDLING") {
        Ok(val) => match val.trim().to_lowercase().as_str() {
            "keep" => ImageHandling::Keep,
            "strip" => ImageHandling::Strip,
            "placeholder" => ImageHandling::Placeholder(placeholder),
            other => {
                tracing::warn!(
                    "Invalid value '{}' for OCR_IMAGE_HANDLING. Using placeholder.",
                    other
                );
                ImageHandling::Placeholder(placeholder)
            }
        },
        Err(_) => ImageHandling::Placeholder(placeholder),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ocr: OcrConfig,
    pub extraction: ExtractionSettings,
    pub legacy: LegacyConverterConfig,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Upper bound for a whole upload/resolve/recognize job.
    pub resource_timeout_secs: u64,
    pub max_file_size: u64,
    pub url_expiry_hours: u32,
}

/// Settings consumed read-only by one pipeline invocation.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub auto_apply_ocr: bool,
    pub post_processing: PostProcessingOptions,
}

/// External converter used for legacy `.doc` files.
#[derive(Debug, Clone)]
pub struct LegacyConverterConfig {
    pub command: String,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_OCR_MODEL.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 120,
            resource_timeout_secs: 180,
            max_file_size: MAX_OCR_FILE_SIZE,
            url_expiry_hours: 24,
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            auto_apply_ocr: true,
            post_processing: PostProcessingOptions::default(),
        }
    }
}

impl Default for LegacyConverterConfig {
    fn default() -> Self {
        Self {
            command: "antiword".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or_else(|_| DEFAULT_OCR_MODEL.to_string()),
                api_key: parse_env_opt("OCR_API_KEY"),
                base_url: parse_env_opt("OCR_BASE_URL"),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 120),
                resource_timeout_secs: parse_env_or("OCR_RESOURCE_TIMEOUT", 180),
                max_file_size: parse_env_or("OCR_MAX_FILE_SIZE", MAX_OCR_FILE_SIZE),
                url_expiry_hours: parse_env_or("OCR_URL_EXPIRY_HOURS", 24),
            },
            extraction: ExtractionSettings {
                auto_apply_ocr: parse_env_or("AUTO_APPLY_OCR", true),
                post_processing: PostProcessingOptions {
                    image_handling: parse_image_handling(),
                    remove_empty_lines: parse_env_or("OCR_REMOVE_EMPTY_LINES", true),
                    trim_whitespace: parse_env_or("OCR_TRIM_WHITESPACE", true),
                },
            },
            legacy: LegacyConverterConfig {
                command: env::var("LEGACY_DOC_CONVERTER")
                    .unwrap_or_else(|_| "antiword".to_string()),
                timeout_secs: parse_env_or("LEGACY_DOC_TIMEOUT", 60),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
