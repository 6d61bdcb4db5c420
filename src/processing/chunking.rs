//! Fixed-size sliding-window chunking.
//!
//! Windows are measured in characters (Unicode scalar values) and advance by a constant stride of
//! `chunk_size - overlap`. Boundaries ignore words and sentences, so a chunk may end mid-word;
//! downstream consumers rely on the exact offsets, so keep the policy character based.
//!
//! ```text
//! text:   |-------------------------- 1200 chars --------------------------|
//! chunk0: [0 ............ 500)
//! chunk1:            [450 ............ 950)
//! chunk2:                         [900 ........ 1200)
//! ```

use super::types::{Chunk, ChunkingError};

/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default characters shared by consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Validated window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    /// Validate a `chunk_size`/`overlap` pair.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap,
                chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the start offsets of consecutive chunks. Always positive.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split `text` using these parameters.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Byte position of every character start, plus the end of the text, so windows can be
        // sliced without re-walking the string.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(total.div_ceil(self.stride()).max(1));
        let mut start = 0;
        while start < total {
            let end = (start + self.chunk_size).min(total);
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[boundaries[start]..boundaries[end]].to_string(),
                start_offset: start,
                length: end - start,
            });
            if end == total {
                break;
            }
            start += self.stride();
        }

        chunks
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split `text` into overlapping windows of at most `chunk_size` characters.
///
/// - Returns a single chunk when the text fits in one window and no chunks for empty text.
/// - Rejects `chunk_size == 0` and `overlap >= chunk_size` before touching the text.
/// - The last chunk holds whatever remains and is never padded.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    Ok(ChunkingConfig::new(chunk_size, overlap)?.split(text))
}
