pub mod chunking;
pub mod normalize;
mod service;
pub mod storage;
pub mod types;

pub use chunking::{ChunkingConfig, chunk_text};
pub use normalize::clean;
pub use service::{IngestApi, IngestSettings, IngestionService, ensure_pdf_filename};
pub use types::{BoxedCause, Chunk, ChunkingError, IngestError, IngestionResult, RawUpload};
