#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docsift::config::{ExtractionSettings, OcrConfig};
use docsift::models::SourceFile;

pub const FILE_ID: &str = "file-abc123";
pub const SIGNED_URL: &str = "https://files.example.test/signed/file-abc123";

pub const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";

pub fn ocr_config(base_url: &str) -> OcrConfig {
    OcrConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url.to_string()),
        timeout_secs: 5,
        resource_timeout_secs: 10,
        ..OcrConfig::default()
    }
}

pub fn settings(auto_apply_ocr: bool) -> ExtractionSettings {
    ExtractionSettings {
        auto_apply_ocr,
        ..ExtractionSettings::default()
    }
}

/// Writes `bytes` to `dir/name` and observes it as a source file.
pub async fn write_source(dir: &Path, name: &str, bytes: &[u8]) -> SourceFile {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write source file");
    SourceFile::from_path(&path)
        .await
        .expect("Failed to stat source file")
}

pub fn sidecar_of(source: &SourceFile) -> PathBuf {
    let name = source.path.file_name().unwrap().to_string_lossy();
    source.path.with_file_name(format!(".{name}.docsift.json"))
}

pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};

    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });
    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

pub fn ocr_body(pages: &[&str]) -> serde_json::Value {
    let pages: Vec<_> = pages
        .iter()
        .enumerate()
        .map(|(index, markdown)| json!({ "index": index, "markdown": markdown }))
        .collect();
    json!({ "pages": pages, "model": "mistral-ocr-latest" })
}

/// Mounts all three protocol steps, each expected exactly once.
pub async fn mount_ocr_flow(server: &MockServer, pages: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": FILE_ID, "object": "file", "purpose": "ocr" })),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{FILE_ID}/url")))
        .and(query_param("expiry", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": SIGNED_URL })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocr_body(pages)))
        .expect(1)
        .mount(server)
        .await;
}

/// Fails the test on drop if the server saw any request.
pub async fn forbid_requests(server: &MockServer) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}
