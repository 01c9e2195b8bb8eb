// src/context/bundle.rs

//! Bundle serialization: the on-disk envelope for one or more contexts.
//!
//! A bundle serializes to JSON, optionally gzip-compressed and optionally
//! wrapped in an encrypted payload frame. Loading detects compression by
//! the gzip magic bytes; encryption must be announced by the caller since
//! a ciphertext frame is indistinguishable from garbage.

use crate::compression::{self, CompressionConfig};
use crate::crypto::{CryptoConfig, PayloadCipher};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::{TaptikContext, SPEC_VERSION};

/// Envelope around a set of contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    /// Bundle format version (semver)
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub contexts: Vec<TaptikContext>,
    /// Free-form envelope metadata (exporter name, workspace id, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl ContextBundle {
    pub fn new(contexts: Vec<TaptikContext>) -> Self {
        Self {
            version: SPEC_VERSION.to_string(),
            created_at: Utc::now(),
            contexts,
            metadata: BTreeMap::new(),
        }
    }
}

/// How a bundle is written and read back
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub compress: bool,
    pub compression: CompressionConfig,
    /// When set, payloads are encrypted after optional compression
    pub crypto: Option<CryptoConfig>,
}

/// Serializes bundles to bytes and files
pub struct BundleCodec {
    options: BundleOptions,
    cipher: Option<PayloadCipher>,
}

impl BundleCodec {
    pub fn new(options: BundleOptions) -> Self {
        let cipher = options.crypto.as_ref().map(PayloadCipher::new);
        Self { options, cipher }
    }

    pub fn plain() -> Self {
        Self::new(BundleOptions::default())
    }

    /// Serialize a bundle: JSON, then optional gzip, then optional encryption
    pub fn encode(&self, bundle: &ContextBundle) -> Result<Vec<u8>> {
        let mut payload = serde_json::to_vec_pretty(bundle)?;

        if self.options.compress {
            payload = compression::compress(&payload, &self.options.compression)?;
        }
        if let Some(cipher) = &self.cipher {
            payload = cipher.encrypt(&payload)?;
        }

        debug!(
            "encoded bundle of {} contexts into {} bytes",
            bundle.contexts.len(),
            payload.len()
        );
        Ok(payload)
    }

    /// Deserialize a bundle.
    ///
    /// Decryption runs when the codec carries a cipher; decompression is
    /// applied whenever the (decrypted) payload starts with the gzip magic,
    /// so a plain codec still reads compressed bundles.
    pub fn decode(&self, data: &[u8]) -> Result<ContextBundle> {
        let mut payload = match &self.cipher {
            Some(cipher) => cipher.decrypt(data)?,
            None => data.to_vec(),
        };

        if compression::is_compressed(&payload) {
            payload = compression::decompress(&payload)?;
        }

        let bundle: ContextBundle = serde_json::from_slice(&payload)
            .map_err(|e| Error::InvalidBundle(format!("malformed bundle JSON: {}", e)))?;

        if semver::Version::parse(&bundle.version).is_err() {
            return Err(Error::InvalidBundle(format!(
                "bundle version is not semver: {}",
                bundle.version
            )));
        }
        Ok(bundle)
    }

    pub fn save(&self, bundle: &ContextBundle, path: &Path) -> Result<()> {
        let payload = self.encode(bundle)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, payload)?;
        info!("saved bundle to {}", path.display());
        Ok(())
    }

    pub fn load(&self, path: &Path) -> Result<ContextBundle> {
        let data = fs::read(path)?;
        self.decode(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Category, CategorySection};
    use crate::platform::Platform;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_bundle() -> ContextBundle {
        let mut ctx = TaptikContext::new("sample", vec![Platform::Kiro]);
        ctx.ide = Some(CategorySection::new(
            Category::Ide,
            json!({"kiro": {"steering": ["be concise"], "settings": {"theme": "dark"}}}),
        ));
        let mut bundle = ContextBundle::new(vec![ctx]);
        bundle
            .metadata
            .insert("exporter".to_string(), json!("taptik-core"));
        bundle
    }

    #[test]
    fn test_plain_round_trip() {
        let codec = BundleCodec::plain();
        let bundle = sample_bundle();

        let encoded = codec.encode(&bundle).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), bundle);
    }

    #[test]
    fn test_compressed_round_trip() {
        let codec = BundleCodec::new(BundleOptions {
            compress: true,
            ..Default::default()
        });
        let bundle = sample_bundle();

        let encoded = codec.encode(&bundle).unwrap();
        assert!(compression::is_compressed(&encoded));
        assert_eq!(codec.decode(&encoded).unwrap(), bundle);
    }

    #[test]
    fn test_plain_codec_reads_compressed_bundle() {
        let compressing = BundleCodec::new(BundleOptions {
            compress: true,
            ..Default::default()
        });
        let bundle = sample_bundle();
        let encoded = compressing.encode(&bundle).unwrap();

        assert_eq!(BundleCodec::plain().decode(&encoded).unwrap(), bundle);
    }

    #[test]
    fn test_malformed_json_is_invalid_bundle() {
        let result = BundleCodec::plain().decode(b"{\"version\": 1}");
        assert!(matches!(result, Err(Error::InvalidBundle(_))));
    }

    #[test]
    fn test_non_semver_version_rejected() {
        let mut bundle = sample_bundle();
        bundle.version = "one".to_string();

        let codec = BundleCodec::plain();
        let encoded = codec.encode(&bundle).unwrap();
        assert!(matches!(
            codec.decode(&encoded),
            Err(Error::InvalidBundle(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bundles/sample.taptik");

        let codec = BundleCodec::new(BundleOptions {
            compress: true,
            ..Default::default()
        });
        let bundle = sample_bundle();
        codec.save(&bundle, &path).unwrap();

        assert_eq!(codec.load(&path).unwrap(), bundle);
    }
}
