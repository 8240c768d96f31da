mod sidecar;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CacheRecord, ExtractionMethod, SourceFile};

pub use sidecar::{SidecarCache, SIDECAR_SUFFIX};

/// Persistence for extracted text keyed by source file.
///
/// `save` and `load` degrade to `None` on I/O or decode failure. `load`
/// returns records regardless of staleness; callers compare timestamps
/// with [`CacheRecord::is_valid_for`] or use [`ExtractionCache::load_valid`].
#[async_trait]
pub trait ExtractionCache: Send + Sync {
    async fn save(
        &self,
        text: &str,
        source: &SourceFile,
        method: ExtractionMethod,
    ) -> Option<PathBuf>;

    async fn load(&self, source: &SourceFile) -> Option<CacheRecord>;

    /// Where the record for `source` lives, whether or not it exists yet.
    fn location(&self, source: &SourceFile) -> Option<PathBuf>;

    /// Deletes the record for `source`. `Ok(false)` if there was none.
    async fn remove(&self, source: &SourceFile) -> Result<bool>;

    async fn load_valid(&self, source: &SourceFile) -> Option<CacheRecord> {
        self.load(source)
            .await
            .filter(|record| record.is_valid_for(source))
    }
}
