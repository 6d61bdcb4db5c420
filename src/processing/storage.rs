//! Scoped temporary storage for uploaded bytes.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Uniquely named temporary file holding one upload.
///
/// The file is removed when the guard is dropped, so every exit path of the pipeline releases it,
/// including early returns and unwinding.
#[derive(Debug)]
pub struct ScopedUpload {
    file: NamedTempFile,
}

impl ScopedUpload {
    /// Write `bytes` to a fresh `.pdf` file inside `dir`, or the system temp dir when `None`.
    pub fn store(bytes: &[u8], dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docuchat-upload-").suffix(".pdf");
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), bytes = bytes.len(), "Stored upload");
        Ok(Self { file })
    }

    /// Location of the stored bytes while the guard is alive.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for ScopedUpload {
    fn drop(&mut self) {
        tracing::debug!(path = %self.file.path().display(), "Releasing stored upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_bytes_and_removes_file_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let upload = ScopedUpload::store(b"%PDF-1.5 body", Some(dir.path())).unwrap();
        let path = upload.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 body");

        drop(upload);
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_uploads_get_distinct_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = ScopedUpload::store(b"one", Some(dir.path())).unwrap();
        let second = ScopedUpload::store(b"two", Some(dir.path())).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(ScopedUpload::store(b"bytes", Some(&missing)).is_err());
    }
}
