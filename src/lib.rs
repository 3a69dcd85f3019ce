#![deny(missing_docs)]

//! Client library for uploading documents and reading extracted data points.

/// HTTP client for the document backend.
pub mod client;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;

pub use client::{ApiClient, ApiError, DocumentApi, DocumentFile};
pub use config::Config;
