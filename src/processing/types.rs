//! Core data types and error definitions for the ingestion pipeline.

use crate::extraction::ExtractionError;
use serde::Serialize;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed cause attached to [`IngestError::Internal`].
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced while splitting normalized text into windows.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingError {
    /// A window of zero characters can never make progress.
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    /// The overlap leaves no positive stride between windows.
    #[error("overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Requested overlap in characters.
        overlap: usize,
        /// Requested chunk size in characters.
        chunk_size: usize,
    },
}

/// Errors emitted by the ingestion orchestrator.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload does not carry a `.pdf` filename.
    #[error("Only PDF files are allowed (got '{filename}')")]
    InvalidFileType {
        /// Filename supplied by the caller.
        filename: String,
    },
    /// The PDF could not be opened or decoded.
    #[error("Error extracting text from PDF '{filename}': {source}")]
    Extraction {
        /// Filename supplied by the caller.
        filename: String,
        /// Parser failure.
        #[source]
        source: ExtractionError,
    },
    /// Extraction succeeded but produced too little text to chunk.
    #[error("No readable text found in PDF '{filename}' ({chars} characters, need {minimum})")]
    EmptyDocument {
        /// Filename supplied by the caller.
        filename: String,
        /// Characters left after normalization.
        chars: usize,
        /// Configured minimum.
        minimum: usize,
    },
    /// Chunk size and overlap do not form a valid window.
    #[error("Invalid chunking configuration: {0}")]
    Configuration(#[from] ChunkingError),
    /// Anything the pipeline did not anticipate.
    #[error("Error processing PDF: {context}: {source}")]
    Internal {
        /// What the pipeline was doing when it failed.
        context: String,
        /// Underlying failure.
        #[source]
        source: BoxedCause,
    },
}

impl IngestError {
    /// Wrap an unexpected failure, keeping the original cause as the error source.
    pub fn internal(context: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::Internal {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether the caller can recover by sending a different upload.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileType { .. } | Self::Extraction { .. } | Self::EmptyDocument { .. }
        )
    }

    /// Whether extraction was abandoned because it exceeded its time limit.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Extraction {
                source: ExtractionError::TimedOut { .. },
                ..
            }
        )
    }
}

/// Uploaded document as received from the transport layer.
#[derive(Debug, Clone)]
pub struct RawUpload {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Original filename, used for type validation and diagnostics.
    pub filename: String,
}

impl RawUpload {
    /// Bundle bytes and filename for a single ingestion call.
    pub fn new(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
        }
    }
}

/// Window over the normalized document text.
///
/// Offsets and lengths count Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of the chunk in the sequence, starting at 0.
    pub index: usize,
    /// Chunk contents.
    pub text: String,
    /// Character offset of the first character within the normalized text.
    pub start_offset: usize,
    /// Number of characters in `text`.
    pub length: usize,
}

impl Chunk {
    /// Character offset one past the last character of the chunk.
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }
}

/// Output of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionResult {
    /// Canonical cleaned text of the whole document.
    pub normalized_text: String,
    /// Overlapping windows over `normalized_text`, in offset order.
    pub chunks: Vec<Chunk>,
}

impl IngestionResult {
    /// Number of chunks produced.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Character count of the normalized text.
    pub fn char_count(&self) -> usize {
        self.normalized_text.chars().count()
    }
}
