// src/compression/mod.rs

//! Gzip compression for bundle payloads.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::debug;

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Default compression level (zlib's balanced setting)
pub const DEFAULT_LEVEL: u32 = 6;

/// Compression settings for bundle serialization
#[derive(Debug, Clone, Copy)]
pub struct CompressionConfig {
    /// Gzip level, 0 (store) through 9 (best)
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

/// Compress bytes with gzip at the configured level
pub fn compress(data: &[u8], config: &CompressionConfig) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(config.level.min(9)));
    encoder
        .write_all(data)
        .map_err(|e| Error::Compression(format!("gzip write failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::Compression(format!("gzip finish failed: {}", e)))?;

    debug!(
        "compressed {} bytes to {} ({:.1}%)",
        data.len(),
        compressed.len(),
        ratio(data.len(), compressed.len())
    );
    Ok(compressed)
}

/// Decompress a gzip stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if !is_compressed(data) {
        return Err(Error::Compression(
            "data is not gzip-compressed".to_string(),
        ));
    }

    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Compression(format!("gzip decode failed: {}", e)))?;
    Ok(decompressed)
}

/// Whether bytes start with the gzip magic number
pub fn is_compressed(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

/// Compressed size as a percentage of the original
pub fn ratio(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        100.0
    } else {
        compressed as f64 / original as f64 * 100.0
    }
}

/// Rough advisory estimate of gzip output size for JSON-like text.
///
/// Assumes roughly 4:1 on structured text plus the gzip header overhead;
/// callers must not rely on it for allocation decisions.
pub fn estimate_compressed_size(original: usize) -> usize {
    original / 4 + 32
}
