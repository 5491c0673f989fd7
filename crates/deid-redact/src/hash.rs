//! Keyed hashing for the `hash` operator.
//!
//! Uses HMAC-SHA256 with truncated output, so the same PII value hashes to
//! the same token within a key's lifetime without being reversible.

use crate::error::{RedactionError, Result};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Default number of bytes to keep from HMAC output (16 hex chars).
pub const DEFAULT_TRUNCATION_BYTES: usize = 8;

/// Key material for HMAC-SHA256.
#[derive(Clone)]
pub struct KeyMaterial {
    key: [u8; 32],
    /// Key identifier embedded in hash tokens.
    pub key_id: String,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Create new key material with a random key.
    pub fn generate(key_id: &str) -> Result<Self> {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key).map_err(|e| {
            RedactionError::KeyError(format!("failed to generate random key: {}", e))
        })?;
        Ok(Self {
            key,
            key_id: key_id.to_string(),
        })
    }

    /// Random key identified by its own fingerprint.
    pub fn random() -> Result<Self> {
        let mut key = Self::generate("")?;
        key.key_id = key.fingerprint();
        Ok(key)
    }

    /// Create key material from raw bytes.
    pub fn from_bytes(key: [u8; 32], key_id: &str) -> Self {
        Self {
            key,
            key_id: key_id.to_string(),
        }
    }

    /// Create key material from a base64-encoded string.
    pub fn from_base64(encoded: &str, key_id: &str) -> Result<Self> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RedactionError::KeyError(format!("invalid base64: {}", e)))?;

        let key: [u8; 32] = decoded.as_slice().try_into().map_err(|_| {
            RedactionError::KeyError(format!("key must be 32 bytes, got {}", decoded.len()))
        })?;

        Ok(Self {
            key,
            key_id: key_id.to_string(),
        })
    }

    /// Export key material as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.key)
    }

    /// Short id derived from the key bytes, e.g. `k3f9a01c2`.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key);
        format!("k{}", hex::encode(&digest[..4]))
    }

    /// Compute HMAC-SHA256 of the input and return a truncated hex token.
    pub fn hash(&self, input: &str, truncation_bytes: usize) -> String {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.key).expect("HMAC can take key of any size");
        Mac::update(&mut mac, input.as_bytes());
        let result = Mac::finalize(mac).into_bytes();

        let trunc = truncation_bytes.clamp(4, 32);
        let hex = hex::encode(&result[..trunc]);

        format!("[HASH:{}:{}]", self.key_id, hex)
    }
}

/// Schema version of `redaction.key`.
pub const KEY_FILE_SCHEMA_VERSION: &str = "1.0.0";

const KEY_ALGORITHM: &str = "hmac-sha256";

/// The persisted hashing key.
///
/// One key per file. Regenerating the file yields a new `key_id`, so tokens
/// hashed under different keys never collide silently.
#[derive(Serialize, Deserialize)]
pub struct KeyFile {
    pub schema_version: String,
    pub key_id: String,
    pub created_at: DateTime<Utc>,
    pub algorithm: String,
    /// Base64 key bytes.
    key_material: String,
}

impl std::fmt::Debug for KeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFile")
            .field("schema_version", &self.schema_version)
            .field("key_id", &self.key_id)
            .field("created_at", &self.created_at)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl KeyFile {
    /// Generate a fresh random key whose id is derived from its bytes.
    pub fn generate() -> Result<Self> {
        let key = KeyMaterial::random()?;
        Ok(Self {
            schema_version: KEY_FILE_SCHEMA_VERSION.to_string(),
            key_id: key.key_id.clone(),
            created_at: Utc::now(),
            algorithm: KEY_ALGORITHM.to_string(),
            key_material: key.to_base64(),
        })
    }

    /// Read and check a key file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: KeyFile = serde_json::from_str(&content)?;
        if file.schema_version != KEY_FILE_SCHEMA_VERSION {
            return Err(RedactionError::KeyError(format!(
                "unsupported key file version {} (expected {})",
                file.schema_version, KEY_FILE_SCHEMA_VERSION
            )));
        }
        if file.algorithm != KEY_ALGORITHM {
            return Err(RedactionError::KeyError(format!(
                "unsupported key algorithm '{}'",
                file.algorithm
            )));
        }
        Ok(file)
    }

    /// Write the key file; on Unix it is created with mode 0600.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, &content)?;
        }

        Ok(())
    }

    /// Decode the stored key.
    pub fn key(&self) -> Result<KeyMaterial> {
        KeyMaterial::from_base64(&self.key_material, &self.key_id)
    }
}
