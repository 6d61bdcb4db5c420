//! Ingestion service coordinating storage, extraction, normalization, and chunking.

use crate::{
    config::Config,
    extraction::{ExtractionError, LopdfExtractor, PageExtractor, extract_text},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        chunking::ChunkingConfig,
        normalize::clean,
        storage::ScopedUpload,
        types::{IngestError, IngestionResult, RawUpload},
    },
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Tunables applied to every ingestion handled by an [`IngestionService`].
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Window parameters used when the caller does not override them.
    pub chunking: ChunkingConfig,
    /// Minimum characters of normalized text required to accept a document.
    pub min_document_chars: usize,
    /// Upper bound on extraction time; `None` waits indefinitely.
    pub extract_timeout: Option<Duration>,
    /// Directory for scoped upload files; `None` uses the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl IngestSettings {
    /// Derive pipeline settings from the process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunking: config.chunking,
            min_document_chars: config.min_document_chars,
            extract_timeout: config.extract_timeout,
            temp_dir: config.upload_temp_dir.clone(),
        }
    }
}

/// Abstraction over the ingestion pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Ingest an upload with the service's default chunking parameters.
    async fn ingest(&self, upload: RawUpload) -> Result<IngestionResult, IngestError>;

    /// Ingest an upload with explicit chunking parameters.
    async fn ingest_with(
        &self,
        upload: RawUpload,
        chunking: ChunkingConfig,
    ) -> Result<IngestionResult, IngestError>;

    /// Chunking parameters applied by [`IngestApi::ingest`].
    fn default_chunking(&self) -> ChunkingConfig;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Runs the linear ingestion pipeline for each upload.
///
/// The service holds no per-document state: settings are immutable, the extractor is shared, and
/// metrics are atomic counters, so one instance behind an `Arc` serves any number of concurrent
/// requests.
pub struct IngestionService {
    extractor: Arc<dyn PageExtractor>,
    settings: IngestSettings,
    metrics: Arc<IngestMetrics>,
}

impl IngestionService {
    /// Build a service around an explicit extractor.
    pub fn new(extractor: Arc<dyn PageExtractor>, settings: IngestSettings) -> Self {
        Self {
            extractor,
            settings,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Build a service backed by `lopdf` using the process configuration.
    pub fn from_config(config: &Config) -> Self {
        tracing::info!("Initializing lopdf extractor");
        Self::new(
            Arc::new(LopdfExtractor::new()),
            IngestSettings::from_config(config),
        )
    }

    /// Settings applied by this service.
    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Ingest an upload with the default chunking parameters.
    pub async fn ingest(&self, upload: RawUpload) -> Result<IngestionResult, IngestError> {
        self.ingest_with(upload, self.settings.chunking).await
    }

    /// Ingest an upload: validate, stage, extract, normalize, validate, and chunk.
    pub async fn ingest_with(
        &self,
        upload: RawUpload,
        chunking: ChunkingConfig,
    ) -> Result<IngestionResult, IngestError> {
        let RawUpload { bytes, filename } = upload;
        tracing::info!(filename = %filename, bytes = bytes.len(), "Processing upload");

        let outcome = self.run_pipeline(&bytes, &filename, chunking).await;
        match &outcome {
            Ok(result) => {
                self.metrics.record_document(result.chunk_count() as u64);
                tracing::info!(
                    filename = %filename,
                    characters = result.char_count(),
                    chunks = result.chunk_count(),
                    chunk_size = chunking.chunk_size(),
                    overlap = chunking.overlap(),
                    "Document ingested"
                );
            }
            Err(error) if error.is_client_error() => {
                self.metrics.record_rejection();
                tracing::warn!(filename = %filename, error = %error, "Upload rejected");
            }
            Err(error) => {
                self.metrics.record_rejection();
                tracing::error!(filename = %filename, error = ?error, "Ingestion failed");
            }
        }
        outcome
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn run_pipeline(
        &self,
        bytes: &[u8],
        filename: &str,
        chunking: ChunkingConfig,
    ) -> Result<IngestionResult, IngestError> {
        ensure_pdf_filename(filename)?;

        // Dropped on every return below, which deletes the staged file.
        let upload = ScopedUpload::store(bytes, self.settings.temp_dir.as_deref())
            .map_err(|error| IngestError::internal("failed to stage upload", error))?;

        let raw = self.extract(upload.path(), filename).await?;
        let normalized_text = clean(&raw);

        let chars = normalized_text.chars().count();
        let minimum = self.settings.min_document_chars;
        if normalized_text.is_empty() || chars < minimum {
            return Err(IngestError::EmptyDocument {
                filename: filename.to_string(),
                chars,
                minimum,
            });
        }

        let chunks = chunking.split(&normalized_text);
        tracing::debug!(
            filename,
            characters = chars,
            chunks = chunks.len(),
            stride = chunking.stride(),
            "Chunked document"
        );

        Ok(IngestionResult {
            normalized_text,
            chunks,
        })
    }

    async fn extract(&self, path: &Path, filename: &str) -> Result<String, IngestError> {
        let extractor = Arc::clone(&self.extractor);
        let path = path.to_path_buf();
        let task = tokio::task::spawn_blocking(move || extract_text(extractor.as_ref(), &path));

        let joined = match self.settings.extract_timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                // The blocking task keeps running until the parser returns.
                tracing::warn!(
                    filename,
                    limit_ms = limit.as_millis() as u64,
                    "Extraction timed out; parser thread left to finish in the background"
                );
                IngestError::Extraction {
                    filename: filename.to_string(),
                    source: ExtractionError::TimedOut { after: limit },
                }
            })?,
            None => task.await,
        };

        joined
            .map_err(|error| IngestError::internal("extraction task failed", error))?
            .map_err(|source| IngestError::Extraction {
                filename: filename.to_string(),
                source,
            })
    }
}

/// Reject filenames that do not end in `.pdf`, compared case-insensitively.
pub fn ensure_pdf_filename(filename: &str) -> Result<(), IngestError> {
    if filename.to_ascii_lowercase().ends_with(".pdf") {
        Ok(())
    } else {
        Err(IngestError::InvalidFileType {
            filename: filename.to_string(),
        })
    }
}

#[async_trait]
impl IngestApi for IngestionService {
    async fn ingest(&self, upload: RawUpload) -> Result<IngestionResult, IngestError> {
        IngestionService::ingest(self, upload).await
    }

    async fn ingest_with(
        &self,
        upload: RawUpload,
        chunking: ChunkingConfig,
    ) -> Result<IngestionResult, IngestError> {
        IngestionService::ingest_with(self, upload, chunking).await
    }

    fn default_chunking(&self) -> ChunkingConfig {
        self.settings.chunking
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        IngestionService::metrics_snapshot(self)
    }
}
