use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::ExtractionCache;
use crate::error::{DocsiftError, Result};
use crate::models::{CacheRecord, ExtractionMethod, SourceFile};

pub const SIDECAR_SUFFIX: &str = ".docsift.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores each record as a hidden JSON file next to its source:
/// `report.pdf` is cached in `.report.pdf.docsift.json`.
#[derive(Debug, Clone, Default)]
pub struct SidecarCache;

impl SidecarCache {
    pub fn new() -> Self {
        Self
    }

    /// `None` when the path has no file name component.
    pub fn sidecar_path(source_path: &Path) -> Option<PathBuf> {
        let name = source_path.file_name()?.to_string_lossy();
        let parent = source_path.parent().unwrap_or_else(|| Path::new(""));
        Some(parent.join(format!(".{name}{SIDECAR_SUFFIX}")))
    }

    async fn write_record(&self, record: &CacheRecord) -> Result<PathBuf> {
        let path = Self::sidecar_path(&record.original_file_path).ok_or_else(|| {
            DocsiftError::Cache(format!(
                "No sidecar location for {}",
                record.original_file_path.display()
            ))
        })?;

        let json = serde_json::to_vec_pretty(record)?;

        // Write beside the target and rename so readers never see a partial record.
        let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}-{sequence}.tmp",
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
            std::process::id()
        );
        let tmp = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(path)
    }

    async fn read_record(&self, path: &Path) -> Result<CacheRecord> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ExtractionCache for SidecarCache {
    async fn save(
        &self,
        text: &str,
        source: &SourceFile,
        method: ExtractionMethod,
    ) -> Option<PathBuf> {
        let record = CacheRecord::new(text, source, method);
        match self.write_record(&record).await {
            Ok(path) => {
                info!(
                    source = %source.path.display(),
                    cache = %path.display(),
                    method = %method,
                    "Cached extracted text"
                );
                Some(path)
            }
            Err(e) => {
                warn!(source = %source.path.display(), error = %e, "Failed to write cache record");
                None
            }
        }
    }

    async fn load(&self, source: &SourceFile) -> Option<CacheRecord> {
        let path = self.location(source)?;
        match self.read_record(&path).await {
            Ok(record) => Some(record),
            Err(DocsiftError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(cache = %path.display(), "No cache record");
                None
            }
            Err(e) => {
                warn!(cache = %path.display(), error = %e, "Ignoring unreadable cache record");
                None
            }
        }
    }

    fn location(&self, source: &SourceFile) -> Option<PathBuf> {
        Self::sidecar_path(&source.path)
    }

    async fn remove(&self, source: &SourceFile) -> Result<bool> {
        let Some(path) = self.location(source) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
