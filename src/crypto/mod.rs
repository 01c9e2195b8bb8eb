// src/crypto/mod.rs

//! AES-256-GCM payload encryption.
//!
//! Encrypted payloads use a fixed binary frame:
//!
//! ```text
//! [1 byte version][16 byte IV][16 byte auth tag][32 byte salt?][ciphertext]
//! ```
//!
//! The salt block is present exactly when key derivation is enabled; both
//! sides must agree on [`CryptoConfig::derive_key`] since the frame carries
//! no flag for it. Authentication failures are hard errors: a tampered
//! frame never yields partial plaintext.

use crate::error::{Error, Result};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::Params;
use serde_json::Value;
use tracing::{debug, warn};

/// AES-256-GCM with the frame's 16-byte IV instead of the usual 12
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Frame format version
const PAYLOAD_VERSION: u8 = 0x01;

const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;
const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;

/// scrypt cost parameters: N=2^14, r=8, p=1
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Encryption settings
#[derive(Debug, Clone, Default)]
pub struct CryptoConfig {
    /// Base64-encoded 32-byte secret. Anything else (or no secret at all)
    /// falls back to an ephemeral random key, which makes payloads
    /// undecryptable across processes.
    pub secret: Option<String>,
    /// Stretch the secret through scrypt with a per-payload salt
    pub derive_key: bool,
}

/// Encrypts and decrypts framed payloads
pub struct PayloadCipher {
    key: [u8; KEY_LEN],
    derive_key: bool,
}

impl PayloadCipher {
    pub fn new(config: &CryptoConfig) -> Self {
        let key = match config.secret.as_deref().map(|s| BASE64.decode(s)) {
            Some(Ok(bytes)) if bytes.len() == KEY_LEN => {
                let mut key = [0u8; KEY_LEN];
                key.copy_from_slice(&bytes);
                key
            }
            Some(_) => {
                warn!("configured secret is not a base64 32-byte key, using ephemeral key");
                Self::random_key()
            }
            None => {
                warn!("no encryption secret configured, using ephemeral key");
                Self::random_key()
            }
        };

        Self {
            key,
            derive_key: config.derive_key,
        }
    }

    fn random_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    fn derived_key(&self, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
        let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
            .map_err(|e| Error::Encrypt(format!("invalid scrypt parameters: {}", e)))?;
        let mut derived = [0u8; KEY_LEN];
        scrypt::scrypt(&self.key, salt, &params, &mut derived)
            .map_err(|e| Error::Encrypt(format!("key derivation failed: {}", e)))?;
        Ok(derived)
    }

    /// Encrypt plaintext into a framed payload
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let (key, salt) = if self.derive_key {
            let mut salt = [0u8; SALT_LEN];
            OsRng.fill_bytes(&mut salt);
            (self.derived_key(&salt)?, Some(salt))
        } else {
            (self.key, None)
        };

        let cipher = Aes256Gcm16::new_from_slice(&key)
            .map_err(|e| Error::Encrypt(format!("invalid key length: {}", e)))?;

        let mut ciphertext = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), &[], &mut ciphertext)
            .map_err(|e| Error::Encrypt(format!("AES-GCM encryption failed: {}", e)))?;

        let mut frame =
            Vec::with_capacity(1 + IV_LEN + TAG_LEN + salt.map_or(0, |_| SALT_LEN) + ciphertext.len());
        frame.push(PAYLOAD_VERSION);
        frame.extend_from_slice(&iv);
        frame.extend_from_slice(tag.as_slice());
        if let Some(salt) = salt {
            frame.extend_from_slice(&salt);
        }
        frame.extend_from_slice(&ciphertext);

        debug!("encrypted {} bytes into {} byte frame", plaintext.len(), frame.len());
        Ok(frame)
    }

    /// Decrypt a framed payload.
    ///
    /// Fails on an unknown frame version, a truncated frame, or an
    /// authentication tag mismatch.
    pub fn decrypt(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let salt_len = if self.derive_key { SALT_LEN } else { 0 };
        let header_len = 1 + IV_LEN + TAG_LEN + salt_len;

        if frame.len() < header_len {
            return Err(Error::Decrypt(format!(
                "frame too short: {} bytes, need at least {}",
                frame.len(),
                header_len
            )));
        }
        if frame[0] != PAYLOAD_VERSION {
            return Err(Error::UnsupportedPayloadVersion(frame[0]));
        }

        let iv = &frame[1..1 + IV_LEN];
        let tag = &frame[1 + IV_LEN..1 + IV_LEN + TAG_LEN];
        let key = if self.derive_key {
            let salt = &frame[1 + IV_LEN + TAG_LEN..header_len];
            self.derived_key(salt)?
        } else {
            self.key
        };

        let cipher = Aes256Gcm16::new_from_slice(&key)
            .map_err(|e| Error::Decrypt(format!("invalid key length: {}", e)))?;

        let mut plaintext = frame[header_len..].to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                &[],
                &mut plaintext,
                Tag::<U16>::from_slice(tag),
            )
            .map_err(|_| Error::Decrypt("authentication failed".to_string()))?;

        Ok(plaintext)
    }

    /// Encrypt named fields anywhere in a JSON tree, in place.
    ///
    /// The tree is walked with an explicit worklist (no recursion); every
    /// object field whose name is listed is replaced with
    /// `{"__encrypted": true, "data": "<base64 frame>"}`. Absent fields are
    /// ignored; already-encrypted fields are left untouched.
    pub fn encrypt_sensitive_fields(&self, value: &mut Value, fields: &[&str]) -> Result<()> {
        let mut worklist: Vec<&mut Value> = vec![value];

        while let Some(current) = worklist.pop() {
            match current {
                Value::Object(object) => {
                    for (key, child) in object.iter_mut() {
                        if fields.contains(&key.as_str()) && !is_encrypted_marker(child) {
                            let plaintext = serde_json::to_vec(child)?;
                            let frame = self.encrypt(&plaintext)?;
                            *child = serde_json::json!({
                                "__encrypted": true,
                                "data": BASE64.encode(frame),
                            });
                        } else {
                            worklist.push(child);
                        }
                    }
                }
                Value::Array(array) => worklist.extend(array.iter_mut()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Reverse of [`encrypt_sensitive_fields`](Self::encrypt_sensitive_fields)
    pub fn decrypt_sensitive_fields(&self, value: &mut Value, fields: &[&str]) -> Result<()> {
        let mut worklist: Vec<&mut Value> = vec![value];

        while let Some(current) = worklist.pop() {
            match current {
                Value::Object(object) => {
                    for (key, child) in object.iter_mut() {
                        if fields.contains(&key.as_str()) && is_encrypted_marker(child) {
                            let encoded = child
                                .get("data")
                                .and_then(Value::as_str)
                                .ok_or_else(|| {
                                    Error::Decrypt(format!("field {} has no data", key))
                                })?;
                            let frame = BASE64.decode(encoded).map_err(|e| {
                                Error::Decrypt(format!("field {} is not base64: {}", key, e))
                            })?;
                            let plaintext = self.decrypt(&frame)?;
                            *child = serde_json::from_slice(&plaintext)?;
                        } else {
                            worklist.push(child);
                        }
                    }
                }
                Value::Array(array) => worklist.extend(array.iter_mut()),
                _ => {}
            }
        }
        Ok(())
    }
}

fn is_encrypted_marker(value: &Value) -> bool {
    value.get("__encrypted").and_then(Value::as_bool) == Some(true)
}
