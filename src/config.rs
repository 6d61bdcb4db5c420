use crate::processing::chunking::{ChunkingConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MIN_DOCUMENT_CHARS: usize = 10;
const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was installed twice in the same process.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the Docu-Chat service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Window parameters applied when a request does not override them.
    pub chunking: ChunkingConfig,
    /// Minimum characters of normalized text required to accept a document.
    pub min_document_chars: usize,
    /// Upper bound on PDF text extraction time; `None` disables the limit.
    pub extract_timeout: Option<Duration>,
    /// Directory for scoped upload files; defaults to the system temp dir.
    pub upload_temp_dir: Option<PathBuf>,
    /// Maximum accepted request body for uploads.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            min_document_chars: DEFAULT_MIN_DOCUMENT_CHARS,
            extract_timeout: Some(Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS)),
            upload_temp_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            server_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let chunk_size = parse_or(read("TEXT_SPLITTER_CHUNK_SIZE"), "TEXT_SPLITTER_CHUNK_SIZE")?
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let overlap = parse_or(
            read("TEXT_SPLITTER_CHUNK_OVERLAP"),
            "TEXT_SPLITTER_CHUNK_OVERLAP",
        )?
        .unwrap_or(DEFAULT_CHUNK_OVERLAP);
        let chunking = ChunkingConfig::new(chunk_size, overlap).map_err(|error| {
            ConfigError::InvalidValue(format!(
                "TEXT_SPLITTER_CHUNK_SIZE/TEXT_SPLITTER_CHUNK_OVERLAP ({error})"
            ))
        })?;

        let timeout_secs = parse_or(read("PDF_EXTRACT_TIMEOUT_SECS"), "PDF_EXTRACT_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_EXTRACT_TIMEOUT_SECS);

        Ok(Self {
            chunking,
            min_document_chars: parse_or(read("MIN_DOCUMENT_CHARS"), "MIN_DOCUMENT_CHARS")?
                .unwrap_or(DEFAULT_MIN_DOCUMENT_CHARS),
            extract_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            upload_temp_dir: read("UPLOAD_TEMP_DIR").map(PathBuf::from),
            max_upload_bytes: parse_or(read("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            server_port: parse_or(read("SERVER_PORT"), "SERVER_PORT")?,
        })
    }

    /// Emit the effective settings at debug level.
    pub fn log_summary(&self) {
        tracing::debug!(
            chunk_size = self.chunking.chunk_size(),
            overlap = self.chunking.overlap(),
            min_document_chars = self.min_document_chars,
            extract_timeout = ?self.extract_timeout,
            upload_temp_dir = ?self.upload_temp_dir,
            max_upload_bytes = self.max_upload_bytes,
            server_port = ?self.server_port,
            "Loaded configuration"
        );
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, falling back to defaults when none was installed.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Load configuration from the environment (and `.env`) and install it in the global cache.
///
/// Nothing is logged here because tracing is not installed yet; call [`Config::log_summary`] once
/// it is.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
