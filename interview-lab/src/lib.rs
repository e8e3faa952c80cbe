//! Gemini-backed HTTP service and CLI over `interview-core`.

/// Text-generation providers bridged onto the pipeline.
pub mod adapters;
/// Process configuration.
pub mod config;
/// Error types.
pub mod errors;
/// HTTP router and handlers.
pub mod server;
