use std::io;

use thiserror::Error;

use crate::crypto::{EngineError, KeyError};
use crate::headers::HeaderError;

/// Crate-wide result alias.
pub type Result<T, E = CryptoError> = std::result::Result<T, E>;

/// Which integrity check rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// V2 header HMAC did not match the recomputed value.
    HeaderMac,
    /// AEAD engine rejected the body tag.
    AeadTag,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::HeaderMac => f.write_str("HMAC verification failed"),
            AuthFailure::AeadTag => f.write_str("AEAD tag mismatch"),
        }
    }
}

/// Unified error covering header encoding, authentication, keys, I/O and cipher engines.
/// - Every encrypt/decrypt call fails with exactly one of these.
/// - `From<T>` impls enable `?` across layers.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed, truncated or oversized header bytes.
    #[error("encoding error: {0}")]
    Encoding(#[from] HeaderError),

    /// Header HMAC or AEAD tag verification failed.
    #[error("authentication error: {0}")]
    Authentication(AuthFailure),

    /// Key name missing, unresolvable, or resolved to an unusable key.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Underlying reader/writer failure (not truncation).
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),

    /// Cipher engine rejected parameters or failed to finish.
    #[error("cipher error: {0}")]
    Cipher(EngineError),

    /// Operation not available for the configured cipher.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Object used in a state that cannot satisfy the call.
    #[error("invalid state: {0}")]
    State(String),

    /// Rejected configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<EngineError> for CryptoError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::TagMismatch => CryptoError::Authentication(AuthFailure::AeadTag),
            other => CryptoError::Cipher(other),
        }
    }
}

impl CryptoError {
    /// True for any integrity failure, header or body.
    pub fn is_authentication(&self) -> bool {
        matches!(self, CryptoError::Authentication(_))
    }
}
