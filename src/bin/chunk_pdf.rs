//! Offline ingestion: run a local PDF through the same pipeline the HTTP API uses and print the
//! resulting chunks.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use docuchat::{
    config, logging,
    processing::{ChunkingConfig, IngestionResult, IngestionService, RawUpload},
};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "chunk-pdf",
    about = "Extract, normalize, and chunk a PDF without starting the server"
)]
struct Cli {
    /// PDF file to ingest.
    file: PathBuf,
    /// Characters per chunk (defaults to TEXT_SPLITTER_CHUNK_SIZE or 500).
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Characters shared by consecutive chunks (defaults to TEXT_SPLITTER_CHUNK_OVERLAP or 50).
    #[arg(long)]
    overlap: Option<usize>,
    /// Print the full result as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    filename: &'a str,
    chunk_size: usize,
    overlap: usize,
    #[serde(flatten)]
    result: &'a IngestionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("Failed to load configuration")?;
    logging::init_cli_tracing();
    config.log_summary();

    let defaults = config.chunking;
    let chunking = ChunkingConfig::new(
        cli.chunk_size.unwrap_or(defaults.chunk_size()),
        cli.overlap.unwrap_or(defaults.overlap()),
    )
    .context("Invalid chunking parameters")?;

    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let filename = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let service = IngestionService::from_config(config);
    let result = service
        .ingest_with(RawUpload::new(bytes, filename.clone()), chunking)
        .await
        .with_context(|| format!("Failed to ingest {}", cli.file.display()))?;

    if cli.json {
        let report = JsonReport {
            filename: &filename,
            chunk_size: chunking.chunk_size(),
            overlap: chunking.overlap(),
            result: &result,
        };
        let rendered = serde_json::to_string_pretty(&report).context("Failed to render JSON")?;
        println!("{rendered}");
    } else {
        print_summary(&filename, chunking, &result);
    }
    Ok(())
}

fn print_summary(filename: &str, chunking: ChunkingConfig, result: &IngestionResult) {
    println!(
        "{filename}: {} characters, {} chunks (size {}, overlap {})",
        result.char_count(),
        result.chunk_count(),
        chunking.chunk_size(),
        chunking.overlap()
    );
    for chunk in &result.chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!(
            "  #{:<4} [{}..{}) {preview}",
            chunk.index,
            chunk.start_offset,
            chunk.end_offset()
        );
    }
}
