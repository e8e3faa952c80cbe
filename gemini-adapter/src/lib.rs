//! Rust adapter for the Gemini `generateContent` REST endpoint.
//!
//! This crate provides environment-driven configuration and a minimal client
//! that turns a system prompt and a user prompt into plain response text.

/// HTTP client for `generateContent`.
pub mod client;
/// Endpoint, credential and timeout configuration.
pub mod config;
/// Error types returned by adapter operations.
pub mod error;
/// Request bodies and response text extraction.
pub mod types;

pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use error::GeminiError;
