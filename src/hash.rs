// src/hash.rs

//! SHA-256 hashing for integrity checks and content addressing.
//!
//! Conflict detection hashes both sides of every differing file, and the
//! cache hashes over-long keys before using them as storage keys. A single
//! cryptographic algorithm covers both uses.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read};

/// A SHA-256 digest as a lowercase hex string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash(String);

impl Hash {
    /// Get the digest as a hex string
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the SHA-256 digest of a byte slice
pub fn hash_bytes(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hash(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of data from a reader
///
/// Streams in 8 KiB chunks to avoid loading the content into memory.
pub fn hash_reader<R: Read>(reader: &mut R) -> io::Result<Hash> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Hash(hex::encode(hasher.finalize())))
}

/// Compute a SHA-256 hex digest (convenience function)
#[inline]
pub fn sha256(data: &[u8]) -> String {
    hash_bytes(data).0
}

/// Verify bytes match an expected hex digest (case-insensitive)
pub fn verify_bytes(data: &[u8], expected: &str) -> bool {
    hash_bytes(data).0 == expected.to_lowercase()
}
