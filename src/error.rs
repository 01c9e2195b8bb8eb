// src/error.rs

//! Crate-wide error types.
//!
//! Conversion and validation problems are usually reported through structured
//! result types rather than this enum (callers need renderable reports, not
//! aborts). The variants here cover the hard failures: corrupted crypto
//! framing, I/O, and malformed inputs that cannot produce a partial result.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the conversion/conflict engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid platform: {0}")]
    InvalidPlatform(String),

    #[error("mapping registration error: {0}")]
    MappingRegistration(String),

    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Decryption is a hard failure: tampered or corrupted payloads must
    /// never surface partial plaintext.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("unsupported payload version: {0:#04x}")]
    UnsupportedPayloadVersion(u8),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("merge failed for {path}: {reason}")]
    Merge { path: String, reason: String },
}
