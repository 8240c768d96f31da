use serde::{Deserialize, Serialize};

/// How a file's text was (or was not) obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PlainText,
    PdfTextLayer,
    RichText,
    LegacyDocument,
    RemoteOcr,
    Unsupported,
    OcrDisabled,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlainText => write!(f, "plain_text"),
            Self::PdfTextLayer => write!(f, "pdf_text_layer"),
            Self::RichText => write!(f, "rich_text"),
            Self::LegacyDocument => write!(f, "legacy_document"),
            Self::RemoteOcr => write!(f, "remote_ocr"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::OcrDisabled => write!(f, "ocr_disabled"),
        }
    }
}

impl std::str::FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain_text" | "text" => Ok(Self::PlainText),
            "pdf_text_layer" | "pdf" => Ok(Self::PdfTextLayer),
            "rich_text" | "rtf" => Ok(Self::RichText),
            "legacy_document" | "doc" | "docx" => Ok(Self::LegacyDocument),
            "remote_ocr" | "ocr" => Ok(Self::RemoteOcr),
            "unsupported" => Ok(Self::Unsupported),
            "ocr_disabled" => Ok(Self::OcrDisabled),
            other => Err(format!("unknown extraction method '{other}'")),
        }
    }
}

/// Routing class of a source file, decided from its extension or content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    RichText,
    /// `.docx`, decoded in-process.
    WordDocument,
    /// `.doc`, decoded by an external converter.
    LegacyWord,
    Image,
    Unknown(String),
}

const PLAIN_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "csv", "tsv", "json", "xml", "html", "htm", "log", "yaml",
    "yml", "toml", "ini", "cfg", "conf", "tex", "rs", "py", "js", "ts", "c", "h", "cpp", "hpp",
    "java", "go", "rb", "sh", "swift", "sql",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif", "avif",
];

impl DocumentKind {
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "rtf" => Self::RichText,
            "docx" => Self::WordDocument,
            "doc" => Self::LegacyWord,
            e if PLAIN_TEXT_EXTENSIONS.contains(&e) => Self::PlainText,
            e if IMAGE_EXTENSIONS.contains(&e) => Self::Image,
            _ => Self::Unknown(ext),
        }
    }
}
