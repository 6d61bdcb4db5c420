#![deny(missing_docs)]

//! Core library for the Docu-Chat document ingestion service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction backends.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document ingestion pipeline: staging, normalization, validation, and chunking.
pub mod processing;

#[cfg(test)]
mod test_support;
