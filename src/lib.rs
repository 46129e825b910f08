#![deny(missing_docs)]

//! Core library for the summary gateway HTTP service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters.
pub mod metrics;
/// Request pipeline coordinating validation, extraction, and vendor calls.
pub mod processing;
/// Text-to-speech vendor client.
pub mod speech;
/// Summarization vendor client and response normalization.
pub mod summarization;
/// Shared HTTP client construction, retries, and vendor error decoding.
pub mod upstream;
