//! Tracing configuration and log routing.
//!
//! Logs go to stdout through a compact formatter and, when possible, to a file as well. Setting
//! `DOCUCHAT_LOG_FILE` appends to that path; without it the file lands at `logs/docuchat.log`.
//! File output goes through a non-blocking writer so request handlers never wait on disk.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "DOCUCHAT_LOG_FILE";
const LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "docuchat.log";
const DEFAULT_FILTER: &str = "info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when available, a file layer.
/// - Uses a global guard to keep the non‑blocking writer alive for the process lifetime.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Configure tracing for command-line tools: stderr only, `warn` unless `RUST_LOG` says otherwise.
///
/// Stdout stays free for the tool's own output.
pub fn init_cli_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Build a non-blocking writer for file logging.
///
/// Returns `None` when the log file cannot be opened; stdout logging continues regardless.
fn configure_file_writer() -> Option<NonBlocking> {
    let (non_blocking, guard) = match log_target(std::env::var(LOG_FILE_ENV).ok()) {
        LogTarget::Explicit(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    eprintln!("Failed to create log directory {}: {err}", parent.display());
                    return None;
                }
            }
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
            {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("Failed to open log file {}: {err}", path.display());
                    return None;
                }
            };
            tracing_appender::non_blocking(file)
        }
        LogTarget::Default => {
            if let Err(err) = std::fs::create_dir_all(LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::never(LOG_DIR, LOG_FILE_NAME))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

#[derive(Debug, PartialEq, Eq)]
enum LogTarget {
    Explicit(PathBuf),
    Default,
}

fn log_target(explicit: Option<String>) -> LogTarget {
    match explicit.map(|value| value.trim().to_string()) {
        Some(path) if !path.is_empty() => LogTarget::Explicit(PathBuf::from(path)),
        _ => LogTarget::Default,
    }
}
