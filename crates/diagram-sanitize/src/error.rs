//! Error types for diagram sanitization.
//!
//! This module provides the main error type [`SanitizeError`] which wraps
//! the conditions that can stop a sanitization run before anything is written.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for sanitization operations.
///
/// # Diagnostic Variants
///
/// The `Json` variant keeps the offending source text next to the
/// [`serde_json::Error`], so callers can point at the failing line and column.
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("Error: {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {err}")]
    Json { err: serde_json::Error, src: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SanitizeError {
    /// Create a new `Json` error with the associated source text.
    pub fn new_json_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Json {
            err,
            src: src.into(),
        }
    }

    /// Create a new `MalformedInput` error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}
