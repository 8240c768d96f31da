use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::dispatcher::FormatDispatcher;
use super::extractors::StandardDecoders;
use crate::cache::{ExtractionCache, SidecarCache};
use crate::config::{Config, ExtractionSettings};
use crate::models::{ExtractionMethod, ExtractionOutcome, ExtractionResult, SourceFile};
use crate::ocr::OcrProvider;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// Text was extracted and written to the cache.
    Cached {
        source: PathBuf,
        cache_location: PathBuf,
        method: ExtractionMethod,
    },
}

/// Runs extraction for a source file and persists successful results.
#[derive(Clone)]
pub struct ExtractionOrchestrator {
    dispatcher: FormatDispatcher,
    cache: Arc<dyn ExtractionCache>,
    events: broadcast::Sender<ExtractionEvent>,
}

impl ExtractionOrchestrator {
    pub fn new(dispatcher: FormatDispatcher, cache: Arc<dyn ExtractionCache>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            dispatcher,
            cache,
            events,
        }
    }

    /// Standard decoders, the configured OCR backend and sidecar caching.
    pub fn from_config(config: &Config) -> Self {
        let dispatcher = FormatDispatcher::new(
            Arc::new(StandardDecoders::new(&config.legacy)),
            Arc::new(OcrProvider::new(&config.ocr)),
        );
        Self::new(dispatcher, Arc::new(SidecarCache::new()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExtractionEvent> {
        self.events.subscribe()
    }

    pub fn cache(&self) -> &Arc<dyn ExtractionCache> {
        &self.cache
    }

    pub async fn extract_and_cache(
        &self,
        source: &SourceFile,
        settings: &ExtractionSettings,
        cancel: &CancellationToken,
    ) -> ExtractionOutcome {
        let result = self.dispatcher.extract(source, settings, cancel).await;

        if !result.is_success() {
            debug!(
                path = %source.path.display(),
                reason = ?result.failure_reason(),
                "Extraction produced no text"
            );
            return ExtractionOutcome {
                result,
                cache_location: None,
            };
        }

        let text = result.text.as_deref().unwrap_or_default();
        let cache_location = self.cache.save(text, source, result.method).await;

        if let Some(location) = &cache_location {
            // No subscribers is not an error.
            let _ = self.events.send(ExtractionEvent::Cached {
                source: source.path.clone(),
                cache_location: location.clone(),
                method: result.method,
            });
        }

        ExtractionOutcome {
            result,
            cache_location,
        }
    }

    /// Serves a still-valid cached record without dispatching.
    pub async fn cached_or_extract(
        &self,
        source: &SourceFile,
        settings: &ExtractionSettings,
        cancel: &CancellationToken,
    ) -> ExtractionOutcome {
        if let Some(record) = self.cache.load_valid(source).await {
            debug!(path = %source.path.display(), "Using cached extraction");
            return ExtractionOutcome {
                result: ExtractionResult::success(record.extracted_text, record.extraction_method),
                cache_location: self.cache.location(source),
            };
        }
        self.extract_and_cache(source, settings, cancel).await
    }

    /// Extracts up to `concurrency` sources at a time. Each job runs under a
    /// child of `cancel`; results arrive in completion order.
    pub async fn extract_many(
        &self,
        sources: Vec<SourceFile>,
        settings: &ExtractionSettings,
        concurrency: usize,
        reuse_cache: bool,
        cancel: &CancellationToken,
    ) -> Vec<(SourceFile, ExtractionOutcome)> {
        info!(files = sources.len(), concurrency, "Starting batch extraction");

        stream::iter(sources)
            .map(|source| {
                let job = cancel.child_token();
                async move {
                    let outcome = if reuse_cache {
                        self.cached_or_extract(&source, settings, &job).await
                    } else {
                        self.extract_and_cache(&source, settings, &job).await
                    };
                    (source, outcome)
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}
