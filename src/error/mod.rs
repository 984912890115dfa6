//! # Error Module
//!
//! Error types for the recipe duplicate detector.
//!
//! ## Design Principles
//! - **Never panic** on uploaded data - return errors instead
//! - **Include context** - the offending hash, path or reason
//! - **Advisory only** - a failed check never blocks a recipe write;
//!   the caller decides whether to surface or swallow the error

use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Signature store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while hashing an uploaded image
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Image data is empty")]
    EmptyImage,

    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to decode image: {reason}")]
    DecodeError { reason: String },

    #[error("Invalid perceptual hash {value:?}: {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a recipe signature store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open signature database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Signature store corruption detected at {path}. Rebuild the store and try again.")]
    Corrupted { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DedupError>;
