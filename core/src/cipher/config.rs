//! cipher/config.rs
//! Cipher bean configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, KEY_NAME_TERMINATOR, MAX_CHUNK_SIZE, MAX_KEY_NAME_LEN};
use crate::crypto::CipherSuite;
use crate::types::{CryptoError, Result};

/// Which header format new ciphertext carries. Decryption accepts both regardless.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// V1 with the key alias; readable by every existing consumer.
    #[default]
    Plain,
    /// V2 with HMAC-SHA-256 keyed by the alias key.
    Authenticated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanConfig {
    /// Symbolic name written into every header and resolved for encryption.
    pub key_alias: String,

    /// Engine suite for `CipherBean::from_config`. Ignored when an explicit factory is given.
    #[serde(default)]
    pub suite: Option<CipherSuite>,

    #[serde(default)]
    pub header_policy: HeaderPolicy,

    /// Body bytes read per `update` on the stream paths.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl BeanConfig {
    pub fn new(key_alias: impl Into<String>) -> Self {
        Self {
            key_alias: key_alias.into(),
            suite: None,
            header_policy: HeaderPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_suite(mut self, suite: CipherSuite) -> Self {
        self.suite = Some(suite);
        self
    }

    pub fn with_header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| CryptoError::Config(format!("bean config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_alias.is_empty() {
            return Err(CryptoError::Config("key alias must not be empty".into()));
        }
        if self.key_alias.len() > MAX_KEY_NAME_LEN {
            return Err(CryptoError::Config(format!(
                "key alias exceeds {MAX_KEY_NAME_LEN} bytes"
            )));
        }
        if self.key_alias.as_bytes().contains(&KEY_NAME_TERMINATOR) {
            return Err(CryptoError::Config("key alias contains a NUL byte".into()));
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(CryptoError::Config(format!(
                "chunk size must be 1..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        Ok(())
    }
}
