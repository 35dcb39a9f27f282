use std::fmt;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw symmetric key material.
/// Zeroized on drop; `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&[u8]> for SymmetricKey {
    fn from(b: &[u8]) -> Self {
        Self::new(b.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for SymmetricKey {
    fn from(b: [u8; N]) -> Self {
        Self::new(b.to_vec())
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({} bytes)", self.bytes.len())
    }
}

/// Cipher direction for engine initialization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encrypt"),
            Direction::Decrypt => f.write_str("decrypt"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Symbolic name present but nothing resolves it.
    #[error("key not found: {name}")]
    NotFound { name: String },

    /// Ciphertext header does not identify a key.
    #[error("ciphertext header carries no key name")]
    MissingKeyName,

    /// Resolved key cannot be used with the configured cipher.
    #[error("invalid key length for {algorithm}: {actual} bytes")]
    InvalidLength { algorithm: &'static str, actual: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid key length provided to cipher.
    #[error("invalid key length: expected one of {expected:?}, actual={actual}")]
    InvalidKeyLength { expected: &'static [usize], actual: usize },

    /// Nonce/IV length mismatch for the cipher.
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// `update`/`finish` called before `init`.
    #[error("cipher engine not initialized")]
    NotInitialized,

    /// Ciphertext cannot be a valid output of this cipher.
    #[error("invalid ciphertext length: {len}")]
    InvalidCiphertextLength { len: usize },

    /// Padding check failed on decrypt.
    #[error("bad padding")]
    BadPadding,

    /// AEAD tag mismatch (authentication failure).
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// Caller-supplied output buffer smaller than the engine reported it needs.
    #[error("output buffer too small: need {need}, have {have}")]
    OutputTooSmall { need: usize, have: usize },

    /// General runtime error with context.
    #[error("cipher failure: {0}")]
    Failure(String),
}
