//! PDF text extraction.
//!
//! The parsing engine sits behind [`PageExtractor`] so the orchestrator can be exercised with
//! deterministic fakes. [`LopdfExtractor`] is the production backend. [`extract_text`] turns the
//! per-page output into the single raw string handed to the normalizer.

use lopdf::Document;
use std::error::Error as StdError;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while opening or decoding a PDF.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The parser could not open or decode the file (corrupt or not a PDF).
    #[error("failed to open PDF: {source}")]
    Open {
        /// Parser or I/O failure reported by the backend.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
    /// The document is encrypted and cannot be read without a password.
    #[error("PDF is encrypted")]
    Encrypted,
    /// The backend did not finish within the configured limit.
    #[error("text extraction timed out after {after:?}")]
    TimedOut {
        /// Limit that was exceeded.
        after: Duration,
    },
}

impl ExtractionError {
    /// Wrap a backend failure as [`ExtractionError::Open`].
    pub fn open(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Open {
            source: source.into(),
        }
    }
}

/// Capability to read the text of every page of a stored PDF.
pub trait PageExtractor: Send + Sync {
    /// Return one string per page, in page order.
    ///
    /// Pages without a text layer yield an empty string rather than an error.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;
}

/// [`PageExtractor`] backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    /// Construct the extractor.
    pub const fn new() -> Self {
        Self
    }
}

impl PageExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let document = Document::load(path).map_err(ExtractionError::open)?;
        if document.is_encrypted() {
            return Err(ExtractionError::Encrypted);
        }

        let pages = document.get_pages();
        tracing::debug!(pages = pages.len(), "Loaded PDF document");

        let texts = pages
            .keys()
            .map(|&page_number| match document.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(error) => {
                    tracing::debug!(
                        page = page_number,
                        error = %error,
                        "Page has no extractable text"
                    );
                    String::new()
                }
            })
            .collect();

        Ok(texts)
    }
}

/// Extract the whole document as one string.
///
/// Pages that produced no text are skipped, the rest are joined with a single newline, and the
/// result is trimmed.
pub fn extract_text(extractor: &dyn PageExtractor, path: &Path) -> Result<String, ExtractionError> {
    let pages = extractor.extract_pages(path)?;
    let page_count = pages.len();

    let joined = pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let text = joined.trim().to_string();

    tracing::debug!(pages = page_count, bytes = text.len(), "Extracted PDF text");
    Ok(text)
}
