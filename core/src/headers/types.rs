//! headers/types.rs
//! Header error type and the tagged union over both wire formats.

use std::fmt;

use thiserror::Error;

use crate::crypto::SymmetricKey;
use crate::headers::v1::HeaderV1;
use crate::headers::v2::HeaderV2;
use crate::types::Result;
use crate::utils::fmt_bytes;

/// Wire format of a parsed or constructed header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderVersion {
    /// Length-prefixed legacy layout, unauthenticated.
    V1,
    /// Tagged layout with trailing HMAC-SHA-256.
    V2,
}

impl fmt::Display for HeaderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderVersion::V1 => f.write_str("v1"),
            HeaderVersion::V2 => f.write_str("v2"),
        }
    }
}

/// Encoding errors raised while building or parsing headers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// Source ran out of bytes before the field was complete.
    #[error("header truncated: needed {wanted} more bytes")]
    Truncated { wanted: usize },

    /// V1 total length read as a negative 32-bit integer.
    #[error("negative header length: {raw}")]
    NegativeLength { raw: i32 },

    /// Nonce length negative, above the cap, or overflowing the declared length.
    #[error("invalid nonce length: {len}")]
    InvalidNonceLength { len: i64 },

    /// V1 key-name length negative, above the cap, or inconsistent with the declared length.
    #[error("invalid key name length: {len}")]
    InvalidKeyNameLength { len: i64 },

    /// Key name longer than the format allows.
    #[error("maximum key length exceeded: {max} bytes")]
    KeyNameTooLong { max: usize },

    /// Key name bytes are not valid UTF-8.
    #[error("key name is not valid UTF-8")]
    InvalidKeyName,

    /// V2 headers cannot authenticate without a key name.
    #[error("key name is required")]
    MissingKeyName,

    /// Key name contains the V2 terminator byte.
    #[error("key name contains a NUL byte")]
    KeyNameContainsNul,

    /// Leading tag is not the V2 marker. Absorbed by the dispatcher.
    #[error("header version mismatch: found tag {found}")]
    VersionMismatch { found: i32 },

    /// Source cannot rewind far enough for version fallback.
    #[error("cannot rewind header source: {consumed} bytes consumed, look-back window is {window}")]
    RewindUnsupported { consumed: usize, window: usize },
}

/// Ciphertext header in either wire format.
#[derive(Debug, Clone)]
pub enum CiphertextHeader {
    V1(HeaderV1),
    V2(HeaderV2),
}

impl CiphertextHeader {
    pub fn version(&self) -> HeaderVersion {
        match self {
            CiphertextHeader::V1(_) => HeaderVersion::V1,
            CiphertextHeader::V2(_) => HeaderVersion::V2,
        }
    }

    pub fn nonce(&self) -> &[u8] {
        match self {
            CiphertextHeader::V1(h) => h.nonce(),
            CiphertextHeader::V2(h) => h.nonce(),
        }
    }

    /// Key name, if the header carries one. V2 always does.
    pub fn key_name(&self) -> Option<&str> {
        match self {
            CiphertextHeader::V1(h) => h.key_name(),
            CiphertextHeader::V2(h) => Some(h.key_name()),
        }
    }

    /// Encoded size in bytes.
    pub fn length(&self) -> usize {
        match self {
            CiphertextHeader::V1(h) => h.length(),
            CiphertextHeader::V2(h) => h.length(),
        }
    }

    /// Serialize the header. V2 resolves its HMAC key through the attached resolver.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            CiphertextHeader::V1(h) => Ok(h.encode()),
            CiphertextHeader::V2(h) => h.encode(),
        }
    }

    /// Serialize the header with an explicit key. V1 ignores the key.
    pub fn encode_with_key(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        match self {
            CiphertextHeader::V1(h) => Ok(h.encode()),
            CiphertextHeader::V2(h) => h.encode_with_key(key),
        }
    }
}

impl From<HeaderV1> for CiphertextHeader {
    fn from(h: HeaderV1) -> Self {
        CiphertextHeader::V1(h)
    }
}

impl From<HeaderV2> for CiphertextHeader {
    fn from(h: HeaderV2) -> Self {
        CiphertextHeader::V2(h)
    }
}

impl fmt::Display for CiphertextHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} header: len={} nonce={} key={}",
            self.version(),
            self.length(),
            fmt_bytes(self.nonce()),
            self.key_name().unwrap_or("<none>"),
        )
    }
}
