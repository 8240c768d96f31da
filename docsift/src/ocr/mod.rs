//! Remote OCR
//!
//! Text recognition is delegated to the Mistral document OCR API. A single
//! recognition runs three round-trips against the service:
//!
//! 1. `POST /files` uploads the source bytes (multipart, `purpose=ocr`)
//! 2. `GET /files/{id}/url` resolves a time-bounded signed URL
//! 3. `POST /ocr` recognizes the document behind that URL
//!
//! Each job carries its own `CancellationToken`, checked around every
//! round-trip. Raw page Markdown is cleaned by [`PostProcessor`] before it is
//! returned.
//!
//! # Usage
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr);
//! let token = CancellationToken::new();
//! let text = ocr.recognize(path, &PostProcessingOptions::default(), &token).await;
//! ```

mod api;
mod postprocess;
mod provider;

pub use api::MistralOcrClient;
pub use postprocess::{ImageHandling, PostProcessingOptions, PostProcessor};
pub use provider::{OcrProvider, TextRecognizer};
